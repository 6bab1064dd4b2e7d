use crate::models::{Candidate, Chatroom, LinkResponse, MatchSummary, Message, StatusPayload};

use super::{AsyncState, Slice};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchState {
    pub is_searching: bool,
    /// Proposed match awaiting accept/reject. `Some` but empty when the
    /// backend had nobody to offer.
    pub candidate: Option<Candidate>,
    pub chatrooms: Vec<Chatroom>,
    pub matches: Vec<MatchSummary>,
    pub async_state: AsyncState,
}

impl Slice for MatchState {
    fn async_state(&self) -> &AsyncState {
        &self.async_state
    }

    fn async_state_mut(&mut self) -> &mut AsyncState {
        &mut self.async_state
    }
}

impl MatchState {
    pub fn chatroom(&self, chatroom_id: &str) -> Option<&Chatroom> {
        self.chatrooms.iter().find(|room| room.id == chatroom_id)
    }

    fn chatroom_mut(&mut self, chatroom_id: &str) -> Option<&mut Chatroom> {
        self.chatrooms.iter_mut().find(|room| room.id == chatroom_id)
    }

    /// Locked rooms take no messages. Unknown rooms are not ours to judge.
    pub fn can_compose(&self, chatroom_id: &str) -> bool {
        self.chatroom(chatroom_id).is_none_or(|room| !room.is_locked)
    }

    pub fn searching_started(&mut self) {
        self.is_searching = true;
    }

    pub fn searching_stopped(&mut self) {
        self.is_searching = false;
    }

    /// No validation: an absent payload is stored as an empty candidate.
    pub fn candidate_found(&mut self, candidate: Option<&Candidate>) {
        let candidate = candidate.cloned().unwrap_or_default();
        if !candidate.is_empty() {
            self.is_searching = false;
        }
        self.candidate = Some(candidate);
    }

    /// Accept or reject, the candidate is gone either way. Rooms are appended
    /// without checking for an existing id.
    pub fn link_resolved(&mut self, response: &LinkResponse) {
        if let Some(chatroom) = &response.chatroom {
            self.chatrooms.push(chatroom.clone());
        }
        self.candidate = None;
    }

    /// Appends to the room named in the message. A message for a room we
    /// don't hold is dropped.
    pub fn message_sent(&mut self, message: &Message) -> bool {
        let Some(chatroom_id) = message.chatroom_id.as_deref() else {
            return false;
        };
        let Some(room) = self.chatroom_mut(chatroom_id) else {
            return false;
        };
        room.messages.push(message.clone());
        true
    }

    /// Clears the lock of the room named in the payload, or of `requested_id`
    /// when the payload names none.
    pub fn chatroom_unlocked(&mut self, payload: &StatusPayload, requested_id: &str) -> bool {
        let chatroom_id = payload.chatroom_id.as_deref().unwrap_or(requested_id);
        let Some(room) = self.chatroom_mut(chatroom_id) else {
            return false;
        };
        room.is_locked = false;
        true
    }

    pub fn matches_loaded(&mut self, matches: &[MatchSummary]) {
        self.matches = matches.to_vec();
    }
}
