//! Wire protocol between the evaluator and a connected client.
//!
//! A `ClientMessage`/`ServerMessage` pair trimmed down to what a read-only
//! diff stream needs: there is no cell-editing message here, because edits
//! happen by editing the watched file, not through the socket.

use serde::{Deserialize, Serialize};

use livecell_core::{NodeList, NodeListUpdate, NodeState};

/// Messages a client may send. Currently just a liveness check; editing the
/// watched file is the only way to change the cell list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

/// Messages the server sends: one full snapshot on connect, then a stream
/// of diffs against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<I, O> {
    Snapshot {
        nodes: NodeList<NodeState<I, O>>,
    },
    Update {
        diff: NodeListUpdate<NodeState<I, O>>,
    },
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecell_core::{FreshNames, MapEltUpdate, MapUpdate, NodeEvalStatus, TailUpdate};

    #[test]
    fn snapshot_round_trips_through_json() {
        let names = FreshNames::new();
        let id = names.fresh();
        let mut nodes: NodeList<NodeState<String, String>> = NodeList::new();
        let mut map = std::collections::HashMap::new();
        map.insert(id, MapEltUpdate::Create(NodeState::waiting("a".to_string())));
        let update = NodeListUpdate::new(TailUpdate::new(0, vec![id]), MapUpdate(map.into_iter().collect()));
        nodes.apply_update(&update);

        let msg: ServerMessage<String, String> = ServerMessage::Snapshot { nodes };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ServerMessage<String, String> = serde_json::from_str(&json).unwrap();
        match back {
            ServerMessage::Snapshot { nodes } => assert_eq!(nodes.len(), 1),
            _ => panic!("expected snapshot"),
        }
    }

    #[test]
    fn client_ping_round_trips() {
        let json = serde_json::to_string(&ClientMessage::Ping).unwrap();
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ClientMessage::Ping));
    }

    #[test]
    fn complete_status_wraps_its_result() {
        let status: NodeEvalStatus<i32> = NodeEvalStatus::Complete(5);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["Complete"], 5);

        let waiting: NodeEvalStatus<i32> = NodeEvalStatus::Waiting;
        assert_eq!(serde_json::to_value(&waiting).unwrap(), "Waiting");
    }
}
