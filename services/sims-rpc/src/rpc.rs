//! The binary RPC's request/response envelope. One connection carries
//! exactly one request; `Events` is the only variant that turns the
//! connection into a server-push loop afterward instead of a single
//! request/response round trip.

use serde::{Deserialize, Serialize};
use sims_protocol::{
    ConnectRequest, DisconnectRequest, ErrorCode, Event, EventsRequest, HeartbeatRequest,
    ListResponse, MulticastRequest, MulticastResponse, UnicastRequest,
};

#[derive(Debug, Serialize, Deserialize)]
pub enum RpcRequest {
    Connect(ConnectRequest),
    Heartbeat(HeartbeatRequest),
    Disconnect(DisconnectRequest),
    List,
    Unicast(UnicastRequest),
    Multicast(MulticastRequest),
    Events(EventsRequest),
}

#[derive(Debug, Serialize, Deserialize)]
pub enum RpcResponse {
    Ok,
    List(ListResponse),
    Multicast(MulticastResponse),
    /// One pushed event, sent repeatedly once an `Events` request is
    /// accepted.
    Event(Event),
    /// The channel was torn down; no more `Event` frames will follow.
    EventsEnd,
    Err(ErrorCode),
}
