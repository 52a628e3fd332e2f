//! CLI entry points for the chat client

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use futures::StreamExt;

use super::client::HttpTransport;
use crate::chat::{
    Message, MessageRequest, MessageTransport, Providers, TextStreamDecoder, SEND_FAILED_TOAST,
};
use crate::config::ClientConfig;
use crate::tui::TuiApp;

/// Run the interactive terminal chat against `config.endpoint`
pub async fn run_tui_chat(config: &ClientConfig) -> Result<()> {
    let providers = Providers::new()?;
    let controller = providers.chat_controller(config);
    tracing::info!("Chatting with {}", config.endpoint);

    let mut app = TuiApp::new(controller).context("Failed to initialize terminal")?;
    app.run().await
}

/// Send one message and print the reply to stdout as it streams in
pub async fn run_send(text: &str, config: &ClientConfig) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Message is empty");
    }

    let providers = Providers::new()?;
    let transport = HttpTransport::new(providers.http().clone(), config.endpoint.clone());
    let request = MessageRequest::single(Message::user(text));

    let stream = match transport.send(&request).await {
        Ok(Some(stream)) => stream,
        Ok(None) => {
            tracing::error!("No stream found");
            bail!(SEND_FAILED_TOAST);
        }
        Err(e) => {
            tracing::error!("Send failed: {}", e);
            bail!(SEND_FAILED_TOAST);
        }
    };

    write_stream(stream, &mut io::stdout()).await
}

/// Decode `stream` into `out`, flushing after every chunk
async fn write_stream<W: Write>(
    mut stream: crate::chat::ByteStream,
    out: &mut W,
) -> Result<()> {
    let mut decoder = TextStreamDecoder::new();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::error!("Reply stream failed: {}", e);
                writeln!(out)?;
                bail!(SEND_FAILED_TOAST);
            }
        };
        out.write_all(decoder.decode(&chunk).as_bytes())?;
        out.flush()?;
    }
    out.write_all(decoder.finish().as_bytes())?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
