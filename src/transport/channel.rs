// src/transport/channel.rs
//! Message-framed транспорт: каждое сообщение – готовый кадр, без разбора строк.
//!
//! Используется для встраивания арены в процесс (тесты, боты в том же бинаре).

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::PlayerHandle;

/// Кадр, который арена отправляет игроку.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Message { action: String, text: String },
    /// Арена просит закрыть соединение.
    Disconnect,
}

impl Frame {
    pub fn action(&self) -> Option<&str> {
        match self {
            Frame::Message { action, .. } => Some(action),
            Frame::Disconnect => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Frame::Message { text, .. } => Some(text),
            Frame::Disconnect => None,
        }
    }
}

/// Игрок на канале кадров. Получатель закрыт – отправка молча теряется.
#[derive(Clone, Debug)]
pub struct ChannelPlayer {
    tx: UnboundedSender<Frame>,
}

impl ChannelPlayer {
    /// Хэндл для арены и приёмник кадров для клиента.
    pub fn new() -> (Self, UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn boxed() -> (Box<dyn PlayerHandle>, UnboundedReceiver<Frame>) {
        let (player, rx) = Self::new();
        (Box::new(player), rx)
    }
}

impl PlayerHandle for ChannelPlayer {
    fn send(&self, action: &str, text: &str) {
        let _ = self.tx.send(Frame::Message {
            action: action.to_uppercase(),
            text: text.to_string(),
        });
    }

    fn force_disconnect(&self) {
        let _ = self.tx.send(Frame::Disconnect);
    }
}

/// Вычитать всё, что уже лежит в канале.
pub fn drain(rx: &mut UnboundedReceiver<Frame>) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}
