//! An HTTP endpoint collecting the messages a relayed remote posts.

use remote::types::Message;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::JoinHandle,
};

/// A running relay sink.
#[derive(Debug)]
pub struct RelaySink {
    pub local_addr: SocketAddr,
    pub messages: mpsc::UnboundedReceiver<Message>,
    task: JoinHandle<()>,
}

impl Drop for RelaySink {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl RelaySink {
    /// Binds the sink to a random port.
    pub async fn spawn() -> eyre::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let local_addr = listener.local_addr()?;
        let (tx, messages) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, tx.clone()));
            }
        });
        Ok(Self { local_addr, messages, task })
    }

    /// The url the remote posts to.
    pub fn url(&self) -> url::Url {
        format!("http://{}/relay", self.local_addr).parse().expect("valid url")
    }
}

/// Serves keep-alive POSTs on one connection.
async fn serve(stream: TcpStream, tx: mpsc::UnboundedSender<Message>) -> eyre::Result<()> {
    let mut stream = BufReader::new(stream);
    loop {
        let mut content_length = 0;
        let mut line = String::new();
        loop {
            line.clear();
            if stream.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse()?;
            }
        }

        let mut body = vec![0; content_length];
        stream.read_exact(&mut body).await?;
        let _ = tx.send(serde_json::from_slice(&body)?);
        stream.get_mut().write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n").await?;
    }
}
