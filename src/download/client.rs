//! Blocking HTTP/1.1 connection handling over plain TCP.
//!
//! One connection per request: resolve the host, try every endpoint in turn,
//! write the request, read the response head. The body (if any) is left in
//! the caller's buffered reader.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use tracing::{debug, instrument};

use super::config::TransferConfig;
use super::error::DownloadError;
use super::http::{
    ResponseHead, StatusLine, build_request, is_head_terminator, parse_header_line,
    parse_status_line,
};
use super::url::{ResourceLocation, split_host_port};

/// Connects to `host` (`name` or `name:port`), trying each resolved endpoint.
///
/// The configured read timeout is applied to the returned stream.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidUrl`] for an unusable authority,
/// [`DownloadError::Resolve`] when resolution fails or yields nothing, and
/// [`DownloadError::Connect`] with the last endpoint's error when no endpoint
/// accepts the connection.
#[instrument(level = "debug", skip(config))]
pub(crate) fn open_connection(
    host: &str,
    url: &str,
    config: &TransferConfig,
) -> Result<TcpStream, DownloadError> {
    let (name, port) = split_host_port(host).ok_or_else(|| DownloadError::invalid_url(url))?;

    let endpoints: Vec<SocketAddr> = (name, port)
        .to_socket_addrs()
        .map_err(|e| DownloadError::resolve(host, e))?
        .collect();
    if endpoints.is_empty() {
        return Err(DownloadError::resolve(
            host,
            io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        ));
    }

    let mut last_error = None;
    for endpoint in endpoints {
        let attempt = match config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&endpoint, timeout),
            None => TcpStream::connect(endpoint),
        };
        match attempt {
            Ok(stream) => {
                stream
                    .set_read_timeout(config.read_timeout)
                    .map_err(|e| DownloadError::connect(host, e))?;
                debug!(%endpoint, "connected");
                return Ok(stream);
            }
            Err(e) => {
                debug!(%endpoint, error = %e, "endpoint refused connection");
                last_error = Some(e);
            }
        }
    }

    Err(DownloadError::connect(
        host,
        last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected)),
    ))
}

/// Writes a complete request to the connection.
pub(crate) fn send_request<W: Write>(
    stream: &mut W,
    request: &str,
    url: &str,
) -> Result<(), DownloadError> {
    stream
        .write_all(request.as_bytes())
        .and_then(|()| stream.flush())
        .map_err(|e| DownloadError::transport(url, e))
}

/// Reads the status line and header lines up to the blank line ending the head.
///
/// Header lines that do not scan to a name/value pair are skipped. Bytes after
/// the head stay buffered in `reader`.
///
/// # Errors
///
/// [`DownloadError::MalformedResponse`] when the status line is unparseable, the
/// connection closes inside the head, or the head exceeds `max_header_bytes`;
/// [`DownloadError::Transport`] on socket errors.
pub(crate) fn read_response_head<R: BufRead>(
    reader: &mut R,
    url: &str,
    max_header_bytes: usize,
) -> Result<ResponseHead, DownloadError> {
    let mut budget = max_header_bytes;
    let mut line = Vec::new();

    let read = read_head_line(reader, &mut budget, &mut line)
        .map_err(|e| DownloadError::transport(url, e))?;
    if read == 0 && budget != 0 {
        return Err(DownloadError::malformed(
            url,
            "connection closed before status line",
        ));
    }
    check_line_complete(&line, budget, max_header_bytes, url)?;

    let status = parse_status_line(&line).ok_or_else(|| {
        DownloadError::malformed(
            url,
            format!(
                "invalid status line {:?}",
                String::from_utf8_lossy(&line).trim_end()
            ),
        )
    })?;

    let mut headers = Vec::new();
    loop {
        read_head_line(reader, &mut budget, &mut line)
            .map_err(|e| DownloadError::transport(url, e))?;
        check_line_complete(&line, budget, max_header_bytes, url)?;
        if is_head_terminator(&line) {
            break;
        }
        if let Some(header) = parse_header_line(&line) {
            headers.push(header);
        }
    }

    debug!(
        status = status.status,
        version = %status.version,
        headers = headers.len(),
        "response head received"
    );
    Ok(ResponseHead { status, headers })
}

/// Rejects anything but an `HTTP/…` 2xx status line.
pub(crate) fn check_status(status: &StatusLine, url: &str) -> Result<(), DownloadError> {
    if !status.is_http() {
        return Err(DownloadError::malformed(
            url,
            format!("unexpected protocol version {:?}", status.version),
        ));
    }
    if !status.is_success() {
        return Err(DownloadError::http_status(url, status.status));
    }
    Ok(())
}

/// Asks the server for `location` and returns its declared `Content-Length`.
///
/// Sends a plain `GET` (no range) and closes the connection as soon as the
/// head has been read. A 2xx response without a usable `Content-Length`
/// yields 0.
///
/// # Errors
///
/// Any connection, protocol or status error from the round-trip.
#[instrument(level = "debug", skip(location, config), fields(host = %location.host))]
pub(crate) fn fetch_content_length(
    location: &ResourceLocation,
    url: &str,
    config: &TransferConfig,
) -> Result<u64, DownloadError> {
    let mut stream = open_connection(&location.host, url, config)?;
    send_request(
        &mut stream,
        &build_request(&location.host, &location.path, None),
        url,
    )?;

    let mut reader = BufReader::new(stream);
    let head = read_response_head(&mut reader, url, config.max_header_bytes)?;
    check_status(&head.status, url)?;

    Ok(head.content_length().unwrap_or(0))
}

fn read_head_line<R: BufRead>(
    reader: &mut R,
    budget: &mut usize,
    line: &mut Vec<u8>,
) -> io::Result<usize> {
    line.clear();
    let limit = u64::try_from(*budget).unwrap_or(u64::MAX);
    let read = reader.by_ref().take(limit).read_until(b'\n', line)?;
    *budget = budget.saturating_sub(read);
    Ok(read)
}

fn check_line_complete(
    line: &[u8],
    budget: usize,
    max_header_bytes: usize,
    url: &str,
) -> Result<(), DownloadError> {
    if line.ends_with(b"\n") {
        return Ok(());
    }
    if budget == 0 {
        return Err(DownloadError::malformed(
            url,
            format!("response head exceeds {max_header_bytes} bytes"),
        ));
    }
    Err(DownloadError::malformed(
        url,
        "connection closed inside response head",
    ))
}
