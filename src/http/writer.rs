use std::io::SeekFrom;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::warn;

use crate::buffer::GrowBuf;
use crate::http::connection::{Connection, SEND_RECV_BUFFER_SIZE};
use crate::http::mime;
use crate::http::response::{Body, Response};

/// Sends a complete response over the connection. In-memory bodies go out
/// as header block + body; file-backed responses are streamed from disk.
pub(crate) async fn send_response(
    conn: &mut Connection,
    request_path: &str,
    response: &Response,
) -> Result<()> {
    match &response.body {
        Body::Bytes(_) => send_buffer(conn, response).await,
        Body::File(path) => send_file(conn, request_path, response, path).await,
    }
}

/// `HTTP/1.0 <code> <status>`, `Content-Type`, exact `Content-Length`,
/// blank line.
fn compose_header(code: u16, status: &str, content_type: &str, content_length: u64) -> GrowBuf {
    let mut header = GrowBuf::new();
    header.append_format(format_args!(
        "HTTP/1.0 {code} {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {content_length}\r\n\r\n"
    ));
    header
}

async fn send_buffer(conn: &mut Connection, response: &Response) -> Result<()> {
    let body = response.body_bytes();
    let header = compose_header(
        response.code,
        &response.status,
        &response.content_type,
        body.len() as u64,
    );
    conn.write_raw(header.as_bytes())
        .await
        .with_context(|| format!("sending response header to {}", conn.remote()))?;
    if !body.is_empty() {
        conn.write_raw(body)
            .await
            .with_context(|| format!("sending response body to {}", conn.remote()))?;
    }
    Ok(())
}

/// Streams a file to the socket in bounded chunks.
///
/// Failures before the header block is sent degrade to a 404 (file missing)
/// or 500 (other I/O error) response. Once the header is on the wire the
/// response cannot be recovered, so later errors abort the connection.
async fn send_file(
    conn: &mut Connection,
    request_path: &str,
    response: &Response,
    path: &Path,
) -> Result<()> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "could not open file, responding 404"
            );
            return send_buffer(conn, &Response::not_found(Some(request_path))).await;
        }
    };

    // First bytes decide the MIME type.
    let mut head = [0u8; mime::SNIFF_SIZE];
    let mut head_len = 0;
    loop {
        let n = match file.read(&mut head[head_len..]).await {
            Ok(n) => n,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "sniff read failed, responding 500");
                return send_buffer(
                    conn,
                    &Response::internal_error(Some("reading file for MIME detection failed")),
                )
                .await;
            }
        };
        if n == 0 {
            break;
        }
        head_len += n;
        if head_len == head.len() {
            break;
        }
    }
    let filename = path.to_string_lossy();
    let content_type = mime::mime_type_for(&filename, &head[..head_len]);

    let length = match seek_length(&mut file).await {
        Ok(length) => length,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not measure file, responding 500");
            return send_buffer(
                conn,
                &Response::internal_error(Some("seeking to determine file length failed")),
            )
            .await;
        }
    };

    let header = compose_header(response.code, &response.status, content_type, length);
    conn.write_raw(header.as_bytes())
        .await
        .with_context(|| format!("sending file response header to {}", conn.remote()))?;

    // The header is committed now; any error below abandons the connection.
    let mut chunk = vec![0u8; SEND_RECV_BUFFER_SIZE];
    loop {
        let n = file
            .read(&mut chunk)
            .await
            .with_context(|| format!("reading '{}' after header was sent", path.display()))?;
        if n == 0 {
            break;
        }
        conn.write_raw(&chunk[..n])
            .await
            .with_context(|| format!("streaming '{}' to {}", path.display(), conn.remote()))?;
    }
    Ok(())
}

/// File length via seek-to-end, rewinding afterwards.
async fn seek_length(file: &mut File) -> std::io::Result<u64> {
    let length = file.seek(SeekFrom::End(0)).await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok(length)
}
