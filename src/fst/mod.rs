use std::collections::VecDeque;

use log_domain::LogDomain;
use num_traits::One;
use std::ops::Mul;

/// Arc and state labels.  `0` is reserved for ε.
pub type Label = u32;
pub type StateId = usize;

pub const EPSILON: Label = 0;

/// A transition of a weighted finite-state transducer.
#[derive(Clone, Debug, PartialEq)]
pub struct FstArc<W> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub to: StateId,
}

/// A mutable weighted finite-state transducer with per-state arc lists.
///
/// This is the construction subset of a WFST library: states, arcs, final
/// weights, trimming and embedding.  Rational operations (determinisation,
/// minimisation, composition) are expected to live outside.
#[derive(Clone, Debug, PartialEq)]
pub struct Fst<W> {
    pub initial: Option<StateId>,
    pub arcs: Vec<Vec<FstArc<W>>>,
    pub finals: Vec<Option<W>>,
}

impl<W> Fst<W> {
    pub fn new() -> Self {
        Fst {
            initial: None,
            arcs: Vec::new(),
            finals: Vec::new(),
        }
    }

    pub fn add_state(&mut self) -> StateId {
        self.arcs.push(Vec::new());
        self.finals.push(None);
        self.arcs.len() - 1
    }

    pub fn set_initial(&mut self, q: StateId) {
        self.initial = Some(q);
    }

    pub fn add_arc(&mut self, from: StateId, arc: FstArc<W>) {
        self.arcs[from].push(arc);
    }

    pub fn set_final(&mut self, q: StateId, weight: W) {
        self.finals[q] = Some(weight);
    }

    pub fn is_final(&self, q: StateId) -> bool {
        self.finals[q].is_some()
    }

    pub fn num_states(&self) -> usize {
        self.arcs.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.iter().map(|a| a.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_none()
    }
}

impl<W> Fst<W>
where
    W: Clone,
{
    /// Copies all states and arcs of `other` into `self` and returns the
    /// offset that was added to `other`'s state ids.  Final weights are
    /// carried over; the initial state of `other` is ignored.
    pub fn embed(&mut self, other: &Fst<W>) -> usize {
        let offset = self.arcs.len();
        for q in 0..other.num_states() {
            let q1 = self.add_state();
            self.finals[q1] = other.finals[q].clone();
            for arc in &other.arcs[q] {
                let mut arc = arc.clone();
                arc.to += offset;
                self.arcs[q1].push(arc);
            }
        }
        offset
    }

    /// Removes every state that is not both reachable from the initial state
    /// and co-reachable to some final state, renumbering the rest.  An
    /// automaton whose initial state dies becomes the empty automaton.
    pub fn trim(&mut self) {
        let n = self.num_states();
        let initial = match self.initial {
            Some(q) => q,
            None => return,
        };

        let mut forward = vec![false; n];
        let mut queue = VecDeque::new();
        forward[initial] = true;
        queue.push_back(initial);
        while let Some(q) = queue.pop_front() {
            for arc in &self.arcs[q] {
                if !forward[arc.to] {
                    forward[arc.to] = true;
                    queue.push_back(arc.to);
                }
            }
        }

        let mut incoming: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for q in 0..n {
            for arc in &self.arcs[q] {
                incoming[arc.to].push(q);
            }
        }
        let mut backward = vec![false; n];
        for q in 0..n {
            if self.finals[q].is_some() {
                backward[q] = true;
                queue.push_back(q);
            }
        }
        while let Some(q) = queue.pop_front() {
            for &p in &incoming[q] {
                if !backward[p] {
                    backward[p] = true;
                    queue.push_back(p);
                }
            }
        }

        let mut renumber = vec![usize::max_value(); n];
        let mut kept = 0;
        for q in 0..n {
            if forward[q] && backward[q] {
                renumber[q] = kept;
                kept += 1;
            }
        }

        if renumber[initial] == usize::max_value() {
            self.initial = None;
            self.arcs.clear();
            self.finals.clear();
            return;
        }

        let mut arcs = Vec::with_capacity(kept);
        let mut finals = Vec::with_capacity(kept);
        for q in 0..n {
            if renumber[q] == usize::max_value() {
                continue;
            }
            let mut qarcs: Vec<FstArc<W>> = Vec::new();
            for arc in &self.arcs[q] {
                if renumber[arc.to] != usize::max_value() {
                    let mut arc = arc.clone();
                    arc.to = renumber[arc.to];
                    qarcs.push(arc);
                }
            }
            arcs.push(qarcs);
            finals.push(self.finals[q].clone());
        }
        self.initial = Some(renumber[initial]);
        self.arcs = arcs;
        self.finals = finals;
    }
}

/// The weight of a lattice arc: a graph score paired with an acoustic score.
/// Multiplication is componentwise; `one` is the pair of ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeWeight {
    pub graph: LogDomain<f64>,
    pub acoustic: LogDomain<f64>,
}

impl Mul for LatticeWeight {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        LatticeWeight {
            graph: self.graph * other.graph,
            acoustic: self.acoustic * other.acoustic,
        }
    }
}

impl One for LatticeWeight {
    fn one() -> Self {
        LatticeWeight {
            graph: LogDomain::one(),
            acoustic: LogDomain::one(),
        }
    }
}

/// A lattice-style graph: transition-ids on the input side, words on the
/// output side, paired weights.
pub type Lattice = Fst<LatticeWeight>;
