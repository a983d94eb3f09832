// End-to-end test of `serve_connection` against a local WebSocket server.
#![allow(clippy::unwrap_used)]

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use streamtopo_api::websocket::{FrameHandler, serve_connection};

/// Replies to every frame with its length; records what it saw.
#[derive(Default)]
struct Recorder {
    opened: u32,
    seen: Vec<String>,
}

impl FrameHandler for Recorder {
    fn on_open(&mut self) {
        self.opened += 1;
    }

    fn handle_frame(&mut self, text: &str) -> Option<String> {
        self.seen.push(text.to_owned());
        if text == "silent" {
            None
        } else {
            Some(format!("len={}", text.len()))
        }
    }
}

#[tokio::test]
async fn replies_are_written_in_order_on_the_same_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(Message::Text(String::from("abc").into())).await.unwrap();
        ws.send(Message::Text(String::from("silent").into())).await.unwrap();
        ws.send(Message::Text(String::from("hello").into())).await.unwrap();

        let mut replies = Vec::new();
        while replies.len() < 2 {
            match ws.next().await {
                Some(Ok(Message::Text(t))) => replies.push(t.as_str().to_owned()),
                Some(Ok(_)) => {}
                _ => break,
            }
        }
        ws.close(None).await.unwrap();
        replies
    });

    let url = Url::parse(&format!("ws://{addr}/topology/ws")).unwrap();
    let mut handler = Recorder::default();
    serve_connection(&url, &mut handler, &CancellationToken::new())
        .await
        .unwrap();

    let replies = server.await.unwrap();
    assert_eq!(replies, vec!["len=3".to_owned(), "len=5".to_owned()]);
    assert_eq!(handler.opened, 1);
    assert_eq!(handler.seen, vec!["abc", "silent", "hello"]);
}

#[tokio::test]
async fn connect_failure_is_an_error() {
    // Bind and drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let url = Url::parse(&format!("ws://{addr}/topology/ws")).unwrap();
    let mut handler = Recorder::default();
    let err = serve_connection(&url, &mut handler, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(handler.opened, 0);
}
