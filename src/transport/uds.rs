use std::path::Path;
use tokio::net::{UnixListener, UnixStream};

/// Connect to a Unix-domain socket.
pub async fn connect(path: impl AsRef<Path>) -> std::io::Result<UnixStream> {
    UnixStream::connect(path).await
}

/// Bind a Unix-domain listener and return it.
pub fn listen(path: impl AsRef<Path>) -> std::io::Result<UnixListener> {
    UnixListener::bind(path)
}

/// Accept a single connection from a listener.
pub async fn accept(listener: &UnixListener) -> std::io::Result<UnixStream> {
    let (stream, _addr) = listener.accept().await?;
    Ok(stream)
}
