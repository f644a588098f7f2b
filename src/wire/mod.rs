// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! On-wire framing, the structured command-message schema, and HMAC
//! authentication (components C2/C3 of the design).

pub mod auth;
pub mod message;
pub mod pdu;
