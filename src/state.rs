//! The association state machine of PS3.8 §9.2.
//!
//! [`association::client`](crate::association::client) and
//! [`association::server`](crate::association::server) each drive their own
//! instance of this state table directly (mirroring how the rest of this
//! crate favours small inline state over a generic engine type), but they
//! share the state/event vocabulary and the legality check defined here so
//! that "this PDU arrived in a state where it isn't legal" is decided in one
//! place and reported with one error shape.

use std::fmt;

/// One of the thirteen states of the upper layer state machine.
///
/// Names and numbering follow PS3.8 Table 9-10 exactly; this crate never
/// implements Sta3/Sta4 (the acceptor's "awaiting local A-ASSOCIATE
/// response" states) as distinct runtime states because
/// [`ServerAssociationOptions::establish`](crate::association::server::ServerAssociationOptions::establish)
/// answers synchronously within the same call that receives the RQ.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum State {
    /// Sta1: idle, no transport open.
    Idle,
    /// Sta2: transport open, awaiting A-ASSOCIATE-RQ (acceptor only).
    AwaitingAssociateRq,
    /// Sta5: requestor sent A-ASSOCIATE-RQ, awaiting AC/RJ.
    AwaitingAssociateResponse,
    /// Sta6: association established, data transfer is legal.
    Established,
    /// Sta7: requestor sent A-RELEASE-RQ, awaiting A-RELEASE-RP.
    AwaitingReleaseResponse,
    /// Sta8: acceptor received A-RELEASE-RQ, awaiting the local
    /// acknowledgement that triggers A-RELEASE-RP.
    AwaitingLocalRelease,
    /// Sta9: both sides issued A-RELEASE-RQ before either saw the other's
    /// (the abort-race / release-collision state, see spec.md Scenario E).
    ReleaseCollisionRequestor,
    /// Sta10: acceptor's side of the same collision, having sent its own
    /// A-RELEASE-RQ and then received the peer's.
    ReleaseCollisionAcceptor,
    /// Sta11: requestor in the collision, awaiting its own A-RELEASE-RP
    /// after sending one to the peer.
    ReleaseCollisionRequestorAwaitingRp,
    /// Sta12: acceptor in the collision, awaiting the peer's A-RELEASE-RP.
    ReleaseCollisionAcceptorAwaitingRp,
    /// Sta13: transport open, association released or never finished
    /// negotiating; only the ARTIM timer or transport closure is expected.
    AwaitingClose,
}

/// An event that can legally fire the state machine forward, per PS3.8
/// Table 9-10. Variants are grouped as local service primitives (issued by
/// this application entity) and network/timer events (observed from the
/// peer or the clock).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Event {
    /// Local: `A-ASSOCIATE-req` (requestor opens the transport and sends RQ).
    AssociateRequest,
    /// Local: `A-ASSOCIATE-rsp` (acceptor answers a pending RQ).
    AssociateResponse,
    /// Local: `P-DATA-req`.
    SendData,
    /// Local: `A-RELEASE-req`.
    ReleaseRequest,
    /// Local: the caller acknowledges a pending release (Sta8 → send RP).
    ReleaseResponse,
    /// Local or network: `A-ABORT-req`/`A-ABORT-ind`.
    Abort,
    /// Network: A-ASSOCIATE-RQ received.
    ReceivedAssociateRq,
    /// Network: A-ASSOCIATE-AC received.
    ReceivedAssociateAc,
    /// Network: A-ASSOCIATE-RJ received.
    ReceivedAssociateRj,
    /// Network: P-DATA-TF received.
    ReceivedData,
    /// Network: A-RELEASE-RQ received.
    ReceivedReleaseRq,
    /// Network: A-RELEASE-RP received.
    ReceivedReleaseRp,
    /// Network: A-ABORT received.
    ReceivedAbort,
    /// Network: the transport reported an error or unexpected close.
    TransportError,
    /// Timer: ARTIM expired.
    ArtimExpired,
}

/// An event was not legal in the state it was observed in. Per spec.md
/// §4.2, the caller's response to this is always the same: emit A-ABORT
/// (source = service-provider, reason = unexpected PDU), close the
/// transport, and return to [`State::Idle`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IllegalTransition {
    pub state: State,
    pub event: Event,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event {:?} is not legal in state {:?}",
            self.event, self.state
        )
    }
}

impl std::error::Error for IllegalTransition {}

/// Look up whether `event` is legal while the association is in `state`,
/// per PS3.8 Table 9-10, and return the resulting state if so.
///
/// This function only encodes *legality*, not the side effects (sending a
/// PDU, starting ARTIM, closing the transport): those remain the
/// responsibility of the caller, exactly as each action `AE-n`/`AR-n`/`AA-n`
/// in the standard is a separate column from the state transition itself.
pub fn transition(state: State, event: Event) -> Result<State, IllegalTransition> {
    use Event::*;
    use State::*;

    let illegal = || Err(IllegalTransition { state, event });

    // An abort or transport error is legal from (almost) any state and
    // always drops back to Idle; ARTIM expiry in Sta2/Sta13 behaves the
    // same way without needing to emit A-ABORT (spec.md §4.2).
    match event {
        Abort | ReceivedAbort | TransportError => {
            return if state == Idle { illegal() } else { Ok(Idle) };
        }
        ArtimExpired => {
            return match state {
                AwaitingAssociateResponse | AwaitingClose => Ok(Idle),
                _ => illegal(),
            };
        }
        _ => {}
    }

    match (state, event) {
        (Idle, AssociateRequest) => Ok(AwaitingAssociateResponse),
        (Idle, ReceivedAssociateRq) => Ok(AwaitingAssociateRq),
        (AwaitingAssociateRq, AssociateResponse) => Ok(Established),

        (AwaitingAssociateResponse, ReceivedAssociateAc) => Ok(Established),
        (AwaitingAssociateResponse, ReceivedAssociateRj) => Ok(Idle),

        (Established, SendData) => Ok(Established),
        (Established, ReceivedData) => Ok(Established),
        (Established, ReleaseRequest) => Ok(AwaitingReleaseResponse),
        (Established, ReceivedReleaseRq) => Ok(AwaitingLocalRelease),

        (AwaitingLocalRelease, ReleaseResponse) => Ok(Idle),

        (AwaitingReleaseResponse, ReceivedReleaseRp) => Ok(Idle),
        // Abort-race (spec.md Scenario E): the requester, already awaiting
        // its own A-RELEASE-RP, observes the peer's A-RELEASE-RQ arrive
        // first.
        (AwaitingReleaseResponse, ReceivedReleaseRq) => Ok(ReleaseCollisionRequestor),

        (ReleaseCollisionRequestor, ReleaseResponse) => Ok(ReleaseCollisionRequestorAwaitingRp),
        (ReleaseCollisionRequestorAwaitingRp, ReceivedReleaseRp) => Ok(Idle),

        (ReleaseCollisionAcceptor, ReceivedReleaseRp) => Ok(ReleaseCollisionAcceptorAwaitingRp),
        (ReleaseCollisionAcceptorAwaitingRp, ReleaseResponse) => Ok(Idle),

        (AwaitingAssociateRq, Abort) => Ok(Idle),

        _ => illegal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(State::Idle, Event::AssociateRequest, State::AwaitingAssociateResponse)]
    #[case(
        State::AwaitingAssociateResponse,
        Event::ReceivedAssociateAc,
        State::Established
    )]
    #[case(State::AwaitingAssociateResponse, Event::ReceivedAssociateRj, State::Idle)]
    #[case(State::Established, Event::SendData, State::Established)]
    #[case(State::Established, Event::ReleaseRequest, State::AwaitingReleaseResponse)]
    #[case(State::AwaitingReleaseResponse, Event::ReceivedReleaseRp, State::Idle)]
    #[case(State::Established, Event::ReceivedReleaseRq, State::AwaitingLocalRelease)]
    #[case(State::AwaitingLocalRelease, Event::ReleaseResponse, State::Idle)]
    fn legal_transitions(#[case] from: State, #[case] event: Event, #[case] to: State) {
        assert_eq!(transition(from, event), Ok(to));
    }

    #[test]
    fn any_state_but_idle_aborts() {
        for state in [
            State::AwaitingAssociateResponse,
            State::Established,
            State::AwaitingReleaseResponse,
            State::AwaitingLocalRelease,
        ] {
            assert_eq!(transition(state, Event::ReceivedAbort), Ok(State::Idle));
            assert_eq!(transition(state, Event::TransportError), Ok(State::Idle));
        }
    }

    #[test]
    fn idle_rejects_data() {
        assert_eq!(
            transition(State::Idle, Event::SendData),
            Err(IllegalTransition {
                state: State::Idle,
                event: Event::SendData,
            })
        );
    }

    #[test]
    fn artim_expiry_only_legal_while_waiting() {
        assert_eq!(
            transition(State::AwaitingAssociateResponse, Event::ArtimExpired),
            Ok(State::Idle)
        );
        assert_eq!(
            transition(State::AwaitingClose, Event::ArtimExpired),
            Ok(State::Idle)
        );
        assert!(transition(State::Established, Event::ArtimExpired).is_err());
    }

    #[test]
    fn release_collision_resolves_to_idle_both_sides() {
        // requester: Sta7 -(RQ received)-> Sta9 -(local ack)-> Sta11 -(RP received)-> Sta1
        let s = transition(State::Established, Event::ReleaseRequest).unwrap();
        let s = transition(s, Event::ReceivedReleaseRq).unwrap();
        assert_eq!(s, State::ReleaseCollisionRequestor);
        let s = transition(s, Event::ReleaseResponse).unwrap();
        assert_eq!(s, State::ReleaseCollisionRequestorAwaitingRp);
        let s = transition(s, Event::ReceivedReleaseRp).unwrap();
        assert_eq!(s, State::Idle);
    }
}
