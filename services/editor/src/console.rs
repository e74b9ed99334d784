//! A text console implementation of the session host.
//!
//! Replies are streamed from the language model straight to the output writer,
//! standing in for the speech pipeline of a real-time room.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use story_editor_core::llm_client::{LLMClient, LLMStreamEvent, build_messages};
use story_editor_core::{HostError, ReplyRequest, SessionHost};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct ConsoleHost<W> {
    llm: Arc<dyn LLMClient>,
    out: Mutex<W>,
    interrupted: AtomicBool,
    room_closed: AtomicBool,
}

impl<W: AsyncWrite + Unpin + Send + 'static> ConsoleHost<W> {
    pub fn new(llm: Arc<dyn LLMClient>, out: W) -> Self {
        Self {
            llm,
            out: Mutex::new(out),
            interrupted: AtomicBool::new(false),
            room_closed: AtomicBool::new(false),
        }
    }

    /// Writes one labelled line, e.g. a reply produced outside the host or a notice.
    pub async fn print_line(&self, speaker: &str, text: &str) -> std::io::Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(format!("{}: {}\n", speaker, text.trim()).as_bytes())
            .await?;
        out.flush().await
    }

    pub fn is_room_closed(&self) -> bool {
        self.room_closed.load(Ordering::SeqCst)
    }

    async fn stream_to_output(&self, request: &ReplyRequest) -> anyhow::Result<Option<String>> {
        let messages = build_messages(
            &request.system_prompt,
            &request.history,
            request.instructions.as_deref(),
        )?;
        let mut stream = self
            .llm
            .stream_reply(&request.backends.llm_model, messages)
            .await?;

        let mut out = self.out.lock().await;
        out.write_all(format!("{} ({}): ", request.agent, request.backends.tts_voice).as_bytes())
            .await?;

        let mut reply = String::new();
        while let Some(event) = stream.next().await {
            if request.allow_interruptions && self.interrupted.load(Ordering::SeqCst) {
                out.write_all(b" [interrupted]\n").await?;
                out.flush().await?;
                return Ok(None);
            }
            let LLMStreamEvent::TextChunk(chunk) = event?;
            out.write_all(chunk.as_bytes()).await?;
            out.flush().await?;
            reply.push_str(&chunk);
        }
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(Some(reply))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> SessionHost for ConsoleHost<W> {
    async fn generate_reply(&self, request: &ReplyRequest) -> Result<String, HostError> {
        if self.is_room_closed() {
            return Err(HostError::Unavailable("the room has been deleted".to_string()));
        }
        self.interrupted.store(false, Ordering::SeqCst);
        debug!(
            agent = %request.agent,
            model = %request.backends.llm_model,
            allow_interruptions = request.allow_interruptions,
            "Generating reply"
        );
        match self.stream_to_output(request).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(HostError::Interrupted),
            Err(e) => Err(HostError::Generation(e.to_string())),
        }
    }

    async fn announce(&self, text: &str) -> Result<(), HostError> {
        if self.is_room_closed() {
            return Err(HostError::Unavailable("the room has been deleted".to_string()));
        }
        self.print_line("system", text)
            .await
            .map_err(|e| HostError::Unavailable(e.to_string()))
    }

    async fn interrupt(&self) -> Result<(), HostError> {
        self.interrupted.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_room(&self, room: &str) -> Result<(), HostError> {
        if self.room_closed.swap(true, Ordering::SeqCst) {
            return Err(HostError::RoomDeletion {
                room: room.to_string(),
                reason: "room was already deleted".to_string(),
            });
        }
        info!(%room, "Room deleted.");
        Ok(())
    }
}

#[cfg(test)]
impl ConsoleHost<Vec<u8>> {
    pub(crate) async fn output(&self) -> String {
        String::from_utf8_lossy(&self.out.lock().await).into_owned()
    }
}
