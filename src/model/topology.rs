use std::collections::VecDeque;

use log_domain::LogDomain;

/// A transition of a per-phone HMM.  A self-loop is an arc with `to` equal to
/// its own state.
#[derive(Clone, Debug, PartialEq)]
pub struct TopoArc {
    pub to: usize,
    pub prob: LogDomain<f64>,
}

/// One state of a per-phone HMM.  Emitting states carry a pdf-class; final
/// (exit) states are non-emitting and have no outgoing arcs.
#[derive(Clone, Debug, PartialEq)]
pub struct TopoState {
    pub pdf_class: Option<usize>,
    pub arcs: Vec<TopoArc>,
}

/// The HMM structure of one phone: entry state `0`, forward transitions,
/// optional self-loops, non-emitting exit states.
#[derive(Clone, Debug, PartialEq)]
pub struct PhoneTopology {
    pub states: Vec<TopoState>,
}

impl PhoneTopology {
    /// Checks the structural invariants: a topology starts in an emitting
    /// state, emitting states have outgoing arcs whose probabilities sum to
    /// one, non-emitting states are exits, and an exit is reachable.
    pub fn new(states: Vec<TopoState>) -> Self {
        assert!(!states.is_empty(), "topology without states");
        assert!(states[0].pdf_class.is_some(), "entry state must be emitting");
        for (i, state) in states.iter().enumerate() {
            match state.pdf_class {
                Some(_) => {
                    assert!(!state.arcs.is_empty(), "emitting state {} has no arcs", i);
                    let mass: f64 = state.arcs.iter().map(|a| a.prob.value()).sum();
                    assert!(
                        (mass - 1.0).abs() < 1e-3,
                        "state {} has outgoing mass {}",
                        i,
                        mass
                    );
                }
                None => assert!(state.arcs.is_empty(), "exit state {} has arcs", i),
            }
            for arc in &state.arcs {
                assert!(arc.to < states.len(), "arc out of state {} leaves the topology", i);
            }
        }
        let topo = PhoneTopology { states };
        assert!(topo.states.iter().any(|s| s.pdf_class.is_none()), "topology has no exit state");
        let _ = topo.min_length();
        topo
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn is_emitting(&self, state: usize) -> bool {
        self.states[state].pdf_class.is_some()
    }

    pub fn is_final(&self, state: usize) -> bool {
        self.states[state].pdf_class.is_none()
    }

    /// Index of the self-loop arc at `state`, if any.
    pub fn self_loop_arc(&self, state: usize) -> Option<usize> {
        self.states[state].arcs.iter().position(|a| a.to == state)
    }

    /// Minimum number of frames needed to traverse the topology: the length
    /// of the shortest arc path from the entry state into an exit state.
    pub fn min_length(&self) -> usize {
        let mut dist = vec![usize::max_value(); self.states.len()];
        let mut queue = VecDeque::new();
        dist[0] = 0;
        queue.push_back(0);
        while let Some(q) = queue.pop_front() {
            if self.is_final(q) {
                return dist[q];
            }
            for arc in &self.states[q].arcs {
                if dist[arc.to] == usize::max_value() {
                    dist[arc.to] = dist[q] + 1;
                    queue.push_back(arc.to);
                }
            }
        }
        panic!("no exit state reachable from the entry state");
    }

    /// Left-to-right topology with one emitting state per `(self_loop_prob,
    /// forward_prob)` pair and a single exit state.  A zero self-loop
    /// probability omits the loop arc.
    pub fn linear(probs: &[(f64, f64)]) -> Self {
        assert!(!probs.is_empty());
        let exit = probs.len();
        let mut states = Vec::with_capacity(exit + 1);
        for (i, &(self_loop, forward)) in probs.iter().enumerate() {
            let mut arcs = Vec::new();
            if self_loop > 0.0 {
                arcs.push(TopoArc {
                    to: i,
                    prob: LogDomain::new(self_loop).unwrap(),
                });
            }
            arcs.push(TopoArc {
                to: i + 1,
                prob: LogDomain::new(forward).unwrap(),
            });
            states.push(TopoState {
                pdf_class: Some(i),
                arcs,
            });
        }
        states.push(TopoState {
            pdf_class: None,
            arcs: Vec::new(),
        });
        PhoneTopology::new(states)
    }
}
