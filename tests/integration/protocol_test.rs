//! JSON-lines server tests over an in-memory duplex stream.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sql_kernel::db::SqlxConnector;
use sql_kernel::kernel::Kernel;
use sql_kernel::protocol::serve;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

/// Sends `requests` to a kernel server and collects every message it writes.
async fn converse(kernel: &mut Kernel, requests: &[Value]) -> Vec<Value> {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);

    let input: String = requests
        .iter()
        .map(|request| format!("{request}\n"))
        .collect();

    let send = async move {
        client_write.write_all(input.as_bytes()).await.unwrap();
        client_write.shutdown().await.unwrap();
    };
    let receive = async move {
        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();
        output
    };

    let (served, (), output) = tokio::join!(
        serve(kernel, BufReader::new(server_read), server_write),
        send,
        receive
    );
    served.unwrap();

    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn execute_request(code: &str, silent: bool) -> Value {
    json!({"msg_type": "execute_request", "content": {"code": code, "silent": silent}})
}

fn kinds(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .map(|m| m["msg_type"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_full_session() {
    let mut kernel = Kernel::new(Box::new(SqlxConnector));

    let messages = converse(
        &mut kernel,
        &[
            json!({"msg_type": "kernel_info_request"}),
            execute_request(
                "!sqlite:///:memory:;\nCREATE TABLE t (id INTEGER, name TEXT);\nINSERT INTO t VALUES (1, 'a');",
                false,
            ),
            execute_request("SELECT * FROM t;", false),
            json!({"msg_type": "shutdown_request"}),
        ],
    )
    .await;

    assert_eq!(
        kinds(&messages),
        vec![
            "kernel_info_reply",
            "stream",
            "execute_reply",
            "stream",
            "execute_reply",
            "shutdown_reply",
        ]
    );
    assert_eq!(messages[0]["content"]["language_info"]["name"], "sql");
    assert_eq!(
        messages[1]["content"],
        json!({"name": "stdout", "text": "Insert succeeded\n"})
    );
    assert_eq!(
        messages[2]["content"],
        json!({"status": "ok", "execution_count": 1})
    );
    assert_eq!(
        messages[3]["content"]["text"],
        "Selected 1 rows:\n+----+------+\n| id | name |\n+----+------+\n| 1  | a    |\n+----+------+\n\n"
    );
    assert_eq!(messages[4]["content"]["execution_count"], 2);
    assert!(!kernel.session().connections().is_connected());
}

#[tokio::test]
async fn test_error_reply_carries_host_fields() {
    let mut kernel = Kernel::new(Box::new(SqlxConnector));

    let messages = converse(
        &mut kernel,
        &[
            execute_request("!sqlite://;", false),
            execute_request("DROP TABLE nonexistent;", false),
        ],
    )
    .await;

    assert_eq!(kinds(&messages), vec!["execute_reply", "error", "execute_reply"]);
    let notification = &messages[1]["content"];
    let reply = &messages[2]["content"];
    assert_eq!(reply["status"], "error");
    assert_eq!(reply["execution_count"], 2);
    assert_eq!(reply["ename"], "QueryError");
    assert_eq!(reply["ename"], notification["ename"]);
    assert_eq!(reply["evalue"], notification["evalue"]);
    assert_eq!(reply["traceback"], notification["traceback"]);
}

#[tokio::test]
async fn test_silent_request_streams_nothing() {
    let mut kernel = Kernel::new(Box::new(SqlxConnector));

    let messages = converse(
        &mut kernel,
        &[
            execute_request("!sqlite://;\nCREATE TABLE t (id INTEGER);\nINSERT INTO t VALUES (1);", true),
            execute_request("SELECT COUNT(*) AS n FROM t;", false),
        ],
    )
    .await;

    assert_eq!(kinds(&messages), vec!["execute_reply", "stream", "execute_reply"]);
    assert!(messages[1]["content"]["text"]
        .as_str()
        .unwrap()
        .contains("| 1 |"));
}

#[tokio::test]
async fn test_malformed_lines_do_not_count_as_executions() {
    let mut kernel = Kernel::new(Box::new(SqlxConnector));

    let messages = converse(
        &mut kernel,
        &[
            json!({"msg_type": "execute_request"}),
            json!({"msg_type": "history_request", "content": {}}),
            execute_request("", false),
        ],
    )
    .await;

    assert_eq!(kinds(&messages), vec!["error", "error", "execute_reply"]);
    assert_eq!(messages[0]["content"]["ename"], "ProtocolError");
    assert_eq!(messages[1]["content"]["ename"], "ProtocolError");
    assert_eq!(messages[2]["content"]["execution_count"], 1);
}
