//! Kernel integration tests against real SQLite databases.

use pretty_assertions::assert_eq;
use sql_kernel::config::{Config, TracebackStyle};
use sql_kernel::db::SqlxConnector;
use sql_kernel::kernel::Kernel;
use sql_kernel::protocol::{ExecuteReply, Message};

fn memory_kernel() -> Kernel {
    Kernel::new(Box::new(SqlxConnector))
}

/// Runs one cell and returns the reply with the stream texts it produced.
async fn execute(kernel: &mut Kernel, code: &str) -> (ExecuteReply, Vec<String>) {
    let mut published = Vec::new();
    let reply = kernel.execute(code, false, &mut published).await;
    let streams = published
        .into_iter()
        .filter_map(|m| match m {
            Message::Stream(s) => Some(s.text),
            _ => None,
        })
        .collect();
    (reply, streams)
}

/// A kernel connected to an in-memory database holding `t(id, name)` = `(1, 'a')`.
async fn seeded_kernel() -> Kernel {
    let mut kernel = memory_kernel();
    let (reply, _) = execute(
        &mut kernel,
        "!sqlite:///:memory:;\nCREATE TABLE t (id INTEGER, name TEXT);\nINSERT INTO t VALUES (1, 'a');",
    )
    .await;
    assert!(reply.is_ok(), "seeding failed: {reply:?}");
    kernel
}

#[tokio::test]
async fn test_directive_only_cell_connects_silently() {
    let mut kernel = memory_kernel();

    let (reply, streams) = execute(&mut kernel, "!sqlite:///:memory:;").await;

    assert!(reply.is_ok());
    assert!(streams.is_empty());
    assert!(kernel.session().connections().is_connected());
}

#[tokio::test]
async fn test_select_renders_table() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(&mut kernel, "SELECT * FROM t;").await;

    assert!(reply.is_ok());
    assert_eq!(
        streams,
        vec![concat!(
            "Selected 1 rows:\n",
            "+----+------+\n",
            "| id | name |\n",
            "+----+------+\n",
            "| 1  | a    |\n",
            "+----+------+\n",
            "\n",
        )
        .to_string()]
    );
}

#[tokio::test]
async fn test_update_reports_affected_rows() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(&mut kernel, "UPDATE t SET name='b' WHERE id=1;").await;

    assert!(reply.is_ok());
    assert_eq!(streams, vec!["Updated 1 rows\n".to_string()]);
}

#[tokio::test]
async fn test_drop_missing_table_is_query_error() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(&mut kernel, "DROP TABLE nonexistent;").await;

    assert_eq!(reply.ename(), Some("QueryError"));
    assert!(streams.is_empty());
    let report = reply.error.unwrap();
    assert!(report.evalue.contains("no such table"), "{}", report.evalue);
}

#[tokio::test]
async fn test_insert_and_delete_rendering() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(
        &mut kernel,
        "INSERT INTO t VALUES (2, 'b');\nINSERT INTO t VALUES (3, 'c');\nDELETE FROM t WHERE id > 1;",
    )
    .await;

    assert!(reply.is_ok());
    assert_eq!(
        streams,
        vec![
            "Insert succeeded\n".to_string(),
            "Insert succeeded\n".to_string(),
            "Deleted 2 rows\n".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_failure_keeps_earlier_effects_and_skips_later_ones() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(
        &mut kernel,
        "INSERT INTO t VALUES (2, 'b');\nSELECT * FROM missing;\nINSERT INTO t VALUES (3, 'c');",
    )
    .await;
    assert_eq!(reply.ename(), Some("QueryError"));
    assert_eq!(streams, vec!["Insert succeeded\n".to_string()]);

    let (_, streams) = execute(&mut kernel, "SELECT COUNT(*) AS n FROM t;").await;
    assert!(streams[0].contains("| 2 |"), "{}", streams[0]);
}

#[tokio::test]
async fn test_empty_select_keeps_header() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(&mut kernel, "SELECT id, name FROM t WHERE id > 100;").await;

    assert!(reply.is_ok());
    assert_eq!(
        streams,
        vec![concat!(
            "Selected 0 rows:\n",
            "+----+------+\n",
            "| id | name |\n",
            "+----+------+\n",
            "+----+------+\n",
            "\n",
        )
        .to_string()]
    );
}

#[tokio::test]
async fn test_value_stringification() {
    let mut kernel = memory_kernel();

    let (reply, streams) = execute(
        &mut kernel,
        "!sqlite://;\nSELECT 2.5 AS f, NULL AS n, x'00ff' AS b, 'x' AS s;",
    )
    .await;

    assert!(reply.is_ok(), "{reply:?}");
    assert_eq!(
        streams,
        vec![concat!(
            "Selected 1 rows:\n",
            "+-----+------+--------+---+\n",
            "| f   | n    | b      | s |\n",
            "+-----+------+--------+---+\n",
            "| 2.5 | NULL | \\x00ff | x |\n",
            "+-----+------+--------+---+\n",
            "\n",
        )
        .to_string()]
    );
}

#[tokio::test]
async fn test_reconnect_replaces_in_memory_database() {
    let mut kernel = seeded_kernel().await;

    let (reply, _) = execute(&mut kernel, "!sqlite://;\nSELECT * FROM t;").await;

    assert_eq!(reply.ename(), Some("QueryError"));
}

#[tokio::test]
async fn test_file_database_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kernel.db");
    let directive = format!("!sqlite:///{};", path.display());
    let mut kernel = memory_kernel();

    let (reply, _) = execute(
        &mut kernel,
        &format!("{directive}\nCREATE TABLE kv (k TEXT);\nINSERT INTO kv VALUES ('x');"),
    )
    .await;
    assert!(reply.is_ok(), "{reply:?}");
    assert!(path.exists());

    let (reply, streams) = execute(
        &mut kernel,
        &format!("!sqlite://;\n{directive}\nSELECT k FROM kv;"),
    )
    .await;
    assert!(reply.is_ok(), "{reply:?}");
    assert!(streams[0].starts_with("Selected 1 rows:\n"));
    assert!(streams[0].contains("| x |"));
}

#[tokio::test]
async fn test_unsupported_backend_is_connection_error() {
    let mut kernel = memory_kernel();

    let (reply, _) = execute(&mut kernel, "!mysql://root@localhost/app;\nSELECT 1;").await;

    assert_eq!(reply.ename(), Some("ConnectionError"));
    assert!(!kernel.session().connections().is_connected());
}

#[tokio::test]
async fn test_named_connection_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("named.db");
    let config: Config = toml::from_str(&format!(
        "[kernel]\ntraceback = \"full\"\n\n[connections.scratch]\nurl = \"sqlite:///{}\"\n",
        path.display()
    ))
    .unwrap();
    let mut kernel = Kernel::from_config(&config);

    let (reply, _) = execute(&mut kernel, "!scratch;\nCREATE TABLE a (id INTEGER);").await;
    assert!(reply.is_ok(), "{reply:?}");
    assert!(path.exists());

    let (reply, _) = execute(&mut kernel, "SELECT * FROM b;").await;
    let traceback = reply.error.unwrap().traceback;
    assert_eq!(config.kernel.traceback, TracebackStyle::Full);
    assert_eq!(traceback.len(), 3);
    assert_eq!(traceback[1], "  at block 1, statement 1: SELECT * FROM b;");
}

#[tokio::test]
async fn test_semicolons_inside_literals_do_not_split() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(
        &mut kernel,
        "INSERT INTO t VALUES (5, 'x;y'); -- trailing comment\nSELECT name FROM t WHERE id = 5;",
    )
    .await;

    assert!(reply.is_ok(), "{reply:?}");
    assert_eq!(streams.len(), 2);
    assert!(streams[1].contains("| x;y  |"), "{}", streams[1]);
}

#[tokio::test]
async fn test_cte_delete_reports_affected_rows() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(
        &mut kernel,
        "INSERT INTO t VALUES (2, 'b');\n\
         WITH c AS (SELECT 1 AS id) DELETE FROM t WHERE id IN (SELECT id FROM c);",
    )
    .await;

    assert!(reply.is_ok(), "{reply:?}");
    assert_eq!(
        streams,
        vec!["Insert succeeded\n".to_string(), "Deleted 1 rows\n".to_string()]
    );
}

#[tokio::test]
async fn test_cte_update_reports_affected_rows() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(
        &mut kernel,
        "WITH c AS (SELECT 1 AS id) UPDATE t SET name = 'z' WHERE id IN (SELECT id FROM c);",
    )
    .await;

    assert!(reply.is_ok(), "{reply:?}");
    assert_eq!(streams, vec!["Updated 1 rows\n".to_string()]);
}

#[tokio::test]
async fn test_comment_prefixed_cte_delete_is_rendered() {
    let mut kernel = seeded_kernel().await;

    let (reply, streams) = execute(
        &mut kernel,
        "/* purge */ WITH c AS (SELECT 1 AS id) DELETE FROM t WHERE id IN (SELECT id FROM c);",
    )
    .await;

    assert!(reply.is_ok(), "{reply:?}");
    assert_eq!(streams, vec!["Deleted 1 rows\n".to_string()]);
}

#[tokio::test]
async fn test_undecodable_text_is_render_error_not_null() {
    let mut kernel = memory_kernel();

    let (reply, streams) = execute(&mut kernel, "!sqlite://;\nSELECT CAST(x'ff' AS TEXT) AS t;").await;

    assert_eq!(reply.ename(), Some("RenderError"));
    assert!(streams.is_empty());
}
