use std::sync::OnceLock;

use intake_core::{ClientIdentity, ClientSession, Reply};

/// Session handed to the intake handler for one stored file.
///
/// The first reply recorded becomes the transfer's failure reply; later ones are
/// dropped.
#[derive(Debug)]
pub struct TransferSession {
    identity: ClientIdentity,
    reply: OnceLock<Reply>,
}

impl TransferSession {
    pub fn new(identity: ClientIdentity) -> Self {
        Self {
            identity,
            reply: OnceLock::new(),
        }
    }

    pub fn into_reply(self) -> Option<Reply> {
        self.reply.into_inner()
    }
}

impl ClientSession for TransferSession {
    fn identity(&self) -> ClientIdentity {
        self.identity.clone()
    }

    fn respond(&self, reply: Reply) {
        if let Err(dropped) = self.reply.set(reply) {
            tracing::debug!(reply = %dropped, "Reply already recorded for this transfer");
        }
    }
}
