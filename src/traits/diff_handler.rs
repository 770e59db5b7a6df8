// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::state::State;

/// Called on the universe thread after every transaction and history move.
///
/// `init` is true only for the initialization transaction. Handlers must not
/// block; hand work off to a channel instead.
pub trait DiffHandler: Send + Sync {
    fn handle(&self, pre: &State, post: &State, init: bool);
}

impl<F> DiffHandler for F
where
    F: Fn(&State, &State, bool) + Send + Sync,
{
    fn handle(&self, pre: &State, post: &State, init: bool) {
        self(pre, post, init)
    }
}
