use crate::net::output::OutFrame;
use crate::net::sink::ClientSink;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::SinkExt;
use futures::stream::SplitSink;
use serde_json::{Value, json};

/// Sends frames as JSON text messages; the page script applies them.
pub struct WebSocketSink {
    writer: SplitSink<WebSocket, Message>,
}

impl WebSocketSink {
    pub fn new(writer: SplitSink<WebSocket, Message>) -> Self {
        Self { writer }
    }
}

/// JSON message for a frame, `None` for frames a browser has no use for.
pub fn frame_json(frame: &OutFrame, seq: u64) -> anyhow::Result<Option<Value>> {
    let mut value = match frame {
        OutFrame::Anim(f) => serde_json::to_value(f)?,
        OutFrame::Line(text) => json!({ "type": "line", "text": text }),
        OutFrame::System(text) => json!({ "type": "system", "text": text }),
        OutFrame::Restart => json!({ "type": "restart" }),
        OutFrame::Bsod => json!({ "type": "bsod" }),
        OutFrame::PageView { .. }
        | OutFrame::Prompt(_)
        | OutFrame::InputEcho
        | OutFrame::Resize { .. }
        | OutFrame::ClearScreen
        | OutFrame::Raw(_) => return Ok(None),
    };
    value["seq"] = json!(seq);
    Ok(Some(value))
}

#[async_trait]
impl ClientSink for WebSocketSink {
    async fn send_frame(&mut self, frame: OutFrame, seq: u64) -> anyhow::Result<()> {
        if let Some(value) = frame_json(&frame, seq)? {
            self.writer.send(Message::Text(value.to_string().into())).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.writer.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{CyclePhase, Frame};

    #[test]
    fn anim_frames_are_tagged() {
        let v = frame_json(
            &OutFrame::Anim(Frame::Segment { block: 2, segment: 1, text: "HI".into() }),
            7,
        )
        .unwrap()
        .unwrap();
        assert_eq!(v, json!({ "type": "segment", "block": 2, "segment": 1, "text": "HI", "seq": 7 }));

        let v = frame_json(
            &OutFrame::Anim(Frame::Word {
                block: 3,
                segment: 3,
                text: "PYTHON".into(),
                phase: CyclePhase::FadeIn,
            }),
            8,
        )
        .unwrap()
        .unwrap();
        assert_eq!(v["phase"], "fade_in");
    }

    #[test]
    fn terminal_only_frames_are_dropped() {
        assert!(frame_json(&OutFrame::InputEcho, 1).unwrap().is_none());
        assert!(frame_json(&OutFrame::Raw(vec![255, 251, 1]), 2).unwrap().is_none());
        assert_eq!(frame_json(&OutFrame::Restart, 3).unwrap().unwrap()["type"], "restart");
    }
}
