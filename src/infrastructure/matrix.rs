//! # Matrix Service Adapter
//!
//! Implements the chat-facing traits for the Matrix protocol using the `matrix_sdk`.
//! `MatrixService` replies into a single room for the command layer; `MatrixBroadcast`
//! exposes the joined-room set and per-room sends to the feed poller.

use crate::domain::error::RelayError;
use crate::domain::traits::{BroadcastTarget, ChatProvider};
use async_trait::async_trait;
use matrix_sdk::Client;
use matrix_sdk::room::Room;
use matrix_sdk::ruma::RoomId;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use std::collections::HashSet;

#[derive(Clone)]
pub struct MatrixService {
    room: Room,
}

impl MatrixService {
    pub fn new(room: Room) -> Self {
        Self { room }
    }
}

#[async_trait]
impl ChatProvider for MatrixService {
    fn room_id(&self) -> String {
        self.room.room_id().as_str().to_string()
    }

    async fn send_message(&self, content: &str) -> Result<String, String> {
        tracing::info!("Bot sending message to {}: {}", self.room_id(), content);
        self.room
            .send(RoomMessageEventContent::text_markdown(content))
            .await
            .map(|resp| resp.event_id.to_string())
            .map_err(|e| e.to_string())
    }
}

/// Broadcast side of the client: whatever rooms the logged-in account has joined.
#[derive(Clone)]
pub struct MatrixBroadcast {
    client: Client,
}

impl MatrixBroadcast {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BroadcastTarget for MatrixBroadcast {
    fn joined_channels(&self) -> HashSet<String> {
        self.client
            .joined_rooms()
            .iter()
            .map(|room| room.room_id().as_str().to_string())
            .collect()
    }

    async fn send(&self, channel: &str, message: &str) -> Result<(), RelayError> {
        let room_id = RoomId::parse(channel).map_err(|e| RelayError::send(channel, e))?;
        let room = self
            .client
            .get_room(&room_id)
            .ok_or_else(|| RelayError::send(channel, "room not known to client"))?;
        room.send(RoomMessageEventContent::text_markdown(message))
            .await
            .map(|_| ())
            .map_err(|e| RelayError::send(channel, e))
    }
}
