//! Hello wire format.
//!
//! A hello is a [`Message`] whose body is a JSON array of [`Address`]
//! objects. The very first hello a process sends after starting carries
//! the metadata entry `Register: "true"`; every other hello omits it.
//! Peers seeing the flag answer with their own hello straight away.

use crate::address::Address;
use crate::message::Message;

/// Metadata key flagging a first-time registration hello.
pub const REGISTER_HEADER: &str = "Register";
pub const REGISTER_VALUE: &str = "true";

/// Default pub/sub topic carrying hellos.
pub const DEFAULT_DISCOVERY_TOPIC: &str = "discovery";

/// Build a hello announcing `addresses`.
pub fn encode_hello(addresses: &[Address], register: bool) -> Result<Message, serde_json::Error> {
    let hello = Message::json(addresses)?;
    if register {
        Ok(hello.with_header(REGISTER_HEADER, REGISTER_VALUE))
    } else {
        Ok(hello)
    }
}

/// Parse the addresses out of a hello body.
pub fn decode_hello(message: &Message) -> Result<Vec<Address>, serde_json::Error> {
    message.decode()
}

/// Whether a hello is flagged as a first-time registration.
pub fn is_register(message: &Message) -> bool {
    message.header(REGISTER_HEADER) == Some(REGISTER_VALUE)
}
