//! Universal Knowledge Store — recognition bus, novelty detection, and
//! one-shot concept allocation over a pool of cortical columns.
//!
//! The store is a winner-take-all circuit built from ordinary neurons:
//!
//! - a **recognition bus** broadcasting the input pattern to every column;
//! - a **Request neuron** that fires only under sustained bus input which no
//!   allocated column is suppressing — the global novelty detector;
//! - a **suppressive gate**: a global inhibitor plus direct lateral
//!   inhibition between column outputs, so at most one column claims a
//!   presentation;
//! - **one-shot allocation**: when the Request neuron fires, a free column
//!   is wired to the current pattern instantly, with no gradual updates.
//!
//! The store owns column metadata and neuron ids only; every operation
//! borrows the [`Network`] explicitly. The host drives `network.step()`
//! first and `uks.step(&mut network)` second, each tick.
//!
//! The store also closes the homeostatic chemistry loop: recognition nudges
//! dopamine, novelty spikes norepinephrine and acetylcholine, and idleness
//! drifts the system toward calm.

use crate::column::{
    CorticalColumn, COLUMN_INHIBITORY_THRESHOLD, COLUMN_INPUT_NEURONS, COLUMN_INPUT_THRESHOLD,
    COLUMN_OUTPUT_THRESHOLD, COLUMN_PYRAMIDAL_NEURONS, COLUMN_PYRAMIDAL_THRESHOLD,
};
use crate::network::Network;
use crate::types::{Charge, NeuronId, WEIGHT_MIN};

/// Bus neurons: low threshold, no leak, minimal refractory — easy to drive
/// externally, able to fire in rapid volleys.
pub const BUS_THRESHOLD: Charge = 2;
pub const BUS_LEAK: Charge = 0;
pub const BUS_REFRACTORY: i32 = 1;

/// Request neuron: high threshold and weak bus fan-in force charge to
/// accumulate across several sustained volleys; the long refractory stops it
/// re-firing during one presentation; the leak bleeds stale charge away.
/// A responding column's 4 x -16 fan-in keeps it below threshold for good.
pub const REQUEST_THRESHOLD: Charge = 130;
pub const REQUEST_LEAK: Charge = 3;
pub const REQUEST_REFRACTORY: i32 = 25;
/// Parallel inhibitory edges from each column output to the Request neuron.
pub const REQUEST_INHIBITION_EDGES: usize = 4;

/// Charge used to prime bus neurons when a pattern is first presented.
pub const BUS_PRIME_CHARGE: Charge = 10;
/// Suppression injected into still-free columns right after an allocation.
pub const ALLOCATION_SUPPRESSION: Charge = -10;

/// Store configuration.
#[derive(Clone, Debug)]
pub struct UksConfig {
    /// Number of cortical columns in the pool.
    pub num_columns: usize,
    /// Recognition bus width (input pattern dimensionality).
    pub bus_width: usize,
    /// Allow one-shot allocation of new concepts.
    pub enable_learning: bool,
    /// Ticks to wait after a presentation before sustained bus injection
    /// begins — gives upstream feature cascades time to settle.
    pub stabilization_ticks: u32,
}

impl Default for UksConfig {
    fn default() -> Self {
        Self {
            num_columns: 100,
            bus_width: 64,
            enable_learning: true,
            stabilization_ticks: 8,
        }
    }
}

pub struct Uks {
    config: UksConfig,
    columns: Vec<CorticalColumn>,
    bus_neurons: Vec<NeuronId>,
    request_neuron: NeuronId,
    global_inhibitor: NeuronId,

    /// Pattern driving sustained bus injection, sorted bus indices.
    pattern: Vec<NeuronId>,
    /// Pattern awaiting allocation. Cleared once a column is wired so the
    /// same presentation cannot allocate twice.
    current_input: Vec<NeuronId>,
    active_column: Option<u32>,
    request_fired: bool,
    ticks_since_present: u32,

    total_allocations: usize,
    total_recognitions: usize,
}

impl Uks {
    /// Build the full store inside `net`: bus, columns, and the WTA circuit.
    pub fn new(net: &mut Network, config: UksConfig) -> Self {
        let mut uks = Self {
            columns: Vec::with_capacity(config.num_columns),
            bus_neurons: Vec::with_capacity(config.bus_width),
            request_neuron: 0,
            global_inhibitor: 0,
            pattern: Vec::new(),
            current_input: Vec::new(),
            active_column: None,
            request_fired: false,
            ticks_since_present: 0,
            total_allocations: 0,
            total_recognitions: 0,
            config,
        };
        uks.build_bus(net);
        uks.build_columns(net);
        uks.build_wta_circuit(net);
        uks
    }

    fn build_bus(&mut self, net: &mut Network) {
        for _ in 0..self.config.bus_width {
            self.bus_neurons
                .push(net.add_neuron(BUS_THRESHOLD, BUS_LEAK, BUS_REFRACTORY));
        }
    }

    /// Construct every column and its fixed internal wiring:
    /// dense (~40%) input->pyramidal excitation, pyramidal->output
    /// convergence, a local inhibitory loop, and sparse (~10%) recurrent
    /// pyramidal<->pyramidal edges whose reverberation decays without
    /// external drive — the column's short-term memory.
    fn build_columns(&mut self, net: &mut Network) {
        for col_id in 0..self.config.num_columns {
            let inputs: Vec<NeuronId> = (0..COLUMN_INPUT_NEURONS)
                .map(|_| net.add_neuron(COLUMN_INPUT_THRESHOLD, 1, 2))
                .collect();
            let pyramidals: Vec<NeuronId> = (0..COLUMN_PYRAMIDAL_NEURONS)
                .map(|_| net.add_neuron(COLUMN_PYRAMIDAL_THRESHOLD, 1, 3))
                .collect();
            // Short refractory on the output lets it keep suppressing the
            // Request neuron across consecutive recognitions.
            let output = net.add_neuron(COLUMN_OUTPUT_THRESHOLD, 0, 2);
            let inhibitory = net.add_neuron(COLUMN_INHIBITORY_THRESHOLD, 0, 2);

            // Input -> pyramidal, dense and strong. Deterministic hash
            // selects ~40% of the pairs.
            for &inp in &inputs {
                for &pyr in &pyramidals {
                    if (inp as u64 * 7 + pyr as u64 * 13) % 5 < 2 {
                        net.connect_neurons(inp, pyr, 5, false);
                    }
                }
            }

            // Pyramidal -> output convergence: many weak edges, so the
            // output only crosses threshold when the cluster agrees.
            for &pyr in &pyramidals {
                net.connect_neurons(pyr, output, 1, false);
            }

            // Local WTA inside the column.
            for &pyr in &pyramidals {
                net.connect_neurons(pyr, inhibitory, 1, false);
            }
            for &pyr in &pyramidals {
                net.connect_neurons(inhibitory, pyr, -2, false);
            }

            // Sparse recurrent loop. +1 against threshold 5 and leak 1
            // yields a reverberation that decays over a few ticks once
            // external input stops.
            for (i, &a) in pyramidals.iter().enumerate() {
                for (j, &b) in pyramidals.iter().enumerate() {
                    if i != j && (a as u64 * 11 + b as u64 * 17) % 10 == 0 {
                        net.connect_neurons(a, b, 1, false);
                    }
                }
            }

            self.columns.push(CorticalColumn::new(
                col_id as u32,
                inputs,
                pyramidals,
                output,
                inhibitory,
            ));
        }
    }

    /// Wire the novelty detector and the suppressive gate.
    fn build_wta_circuit(&mut self, net: &mut Network) {
        self.request_neuron = net.add_neuron(REQUEST_THRESHOLD, REQUEST_LEAK, REQUEST_REFRACTORY);
        self.global_inhibitor = net.add_neuron(COLUMN_INHIBITORY_THRESHOLD, 0, 2);

        // Weak excitation from every bus neuron: one full volley of a
        // realistic pattern (~56 indices) adds ~56 charge, so the Request
        // neuron needs roughly three sustained volleys to reach 130.
        for &bus in &self.bus_neurons {
            net.connect_neurons(bus, self.request_neuron, 1, false);
        }

        // Strong inhibition from every column output: 4 x -16 = -64 per
        // responding column definitively suppresses novelty.
        for col in &self.columns {
            for _ in 0..REQUEST_INHIBITION_EDGES {
                net.connect_neurons(col.output_neuron, self.request_neuron, WEIGHT_MIN, false);
            }
        }

        // Global inhibitor: fast broadcast suppression across columns.
        for col in &self.columns {
            net.connect_neurons(col.output_neuron, self.global_inhibitor, 4, false);
        }
        for col in &self.columns {
            net.connect_neurons(self.global_inhibitor, col.output_neuron, -10, false);
        }

        // Direct lateral inhibition: the best-fit column suppresses the
        // good-fit runners-up.
        for i in 0..self.columns.len() {
            for j in 0..self.columns.len() {
                if i != j {
                    net.connect_neurons(
                        self.columns[i].output_neuron,
                        self.columns[j].output_neuron,
                        -6,
                        false,
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Main interface
    // ------------------------------------------------------------------

    /// Present a pattern of bus indices. Primes the bus immediately; the
    /// sustained, acetylcholine-gated injection starts once the
    /// stabilization window has passed (see [`Uks::step`]). Out-of-range
    /// indices are ignored.
    pub fn present(&mut self, net: &mut Network, pattern: &[NeuronId]) {
        let mut sorted: Vec<NeuronId> = pattern
            .iter()
            .copied()
            .filter(|&idx| (idx as usize) < self.bus_neurons.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        for &idx in &sorted {
            net.inject_charge(self.bus_neurons[idx as usize], BUS_PRIME_CHARGE);
        }

        self.pattern = sorted.clone();
        self.current_input = sorted;
        self.active_column = None;
        self.request_fired = false;
        self.ticks_since_present = 0;
    }

    /// Resolve this tick's winner-take-all outcome. Call after
    /// `network.step()`.
    ///
    /// Exactly one of three things happens: an allocated column recognised
    /// the pattern (first responder wins), the Request neuron flagged
    /// novelty (allocate a free column if learning is on), or nothing fired
    /// and the system drifts toward calm.
    pub fn step(&mut self, net: &mut Network) {
        let responding = self.first_responding_column(net);
        let mut surprise = false;

        if let Some(col_id) = responding {
            // Recognition. A predictable world is mildly rewarding.
            self.active_column = Some(col_id);
            let col = &mut self.columns[col_id as usize];
            col.active = true;
            col.activation_count += 1;
            self.total_recognitions += 1;
            self.request_fired = false;
            net.spike_dopamine(10);
        } else {
            self.request_fired = net.did_fire(self.request_neuron);
            if self.request_fired {
                // Novelty: wake up and attend to the outside world.
                net.surprise_signal(50);
                net.spike_acetylcholine(30);
                surprise = true;

                if self.config.enable_learning && !self.current_input.is_empty() {
                    if let Some(free) = self.find_free_column() {
                        self.allocate_column(net, free);
                        self.active_column = Some(free);
                        // Learning moment: worth remembering.
                        net.spike_dopamine(30);
                        self.current_input.clear();
                    }
                }
            }
        }

        if responding.is_none() && !surprise {
            // Idle: settle. Calm rises, attention drifts inward.
            net.calm_signal(5);
            let chem = net.chemicals_mut();
            if chem.acetylcholine > 30 {
                chem.acetylcholine -= 2;
            }
        }

        for col in self.columns.iter_mut() {
            col.active = net.did_fire(col.output_neuron);
        }

        // Sustained presentation: after the stabilization window, re-inject
        // the pattern every tick at acetylcholine-gated strength (5..=15).
        // Low ACh weakens external drive so internal recurrence can
        // dominate — the consolidation regime.
        self.ticks_since_present += 1;
        if self.ticks_since_present >= self.config.stabilization_ticks && !self.pattern.is_empty() {
            let gain = 5 + (net.chemicals().acetylcholine / 10) as Charge;
            for &idx in &self.pattern {
                net.inject_charge(self.bus_neurons[idx as usize], gain);
            }
        }
    }

    /// Convenience for hosts that don't interleave other work between the
    /// two steps: advance the network one tick, then resolve the store.
    pub fn tick_all(&mut self, net: &mut Network) {
        net.step();
        self.step(net);
    }

    /// Return every column to the free state and clear presentation state.
    /// Column neurons and any learned recognition weights stay in the
    /// network.
    pub fn reset(&mut self) {
        for col in self.columns.iter_mut() {
            col.reset();
        }
        self.pattern.clear();
        self.current_input.clear();
        self.active_column = None;
        self.request_fired = false;
        self.ticks_since_present = 0;
        self.total_allocations = 0;
        self.total_recognitions = 0;
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    fn first_responding_column(&self, net: &Network) -> Option<u32> {
        self.columns
            .iter()
            .find(|col| col.allocated && net.did_fire(col.output_neuron))
            .map(|col| col.id)
    }

    fn find_free_column(&self) -> Option<u32> {
        self.columns.iter().find(|col| !col.allocated).map(|col| col.id)
    }

    /// One-shot learning: wire the current pattern into `col_id` as a
    /// template matcher. Pattern members excite every input neuron at +1;
    /// non-members inhibit at -16, so a mismatched index crushes the sum
    /// below threshold. The wiring is non-plastic and is never rewritten.
    fn allocate_column(&mut self, net: &mut Network, col_id: u32) {
        let tick = net.current_tick();
        {
            let col = &mut self.columns[col_id as usize];
            col.allocated = true;
            col.allocated_at = tick;
        }
        self.total_allocations += 1;

        let col_inputs = self.columns[col_id as usize].input_neurons.clone();
        for (bus_idx, &bus_neuron) in self.bus_neurons.iter().enumerate() {
            let in_pattern = self
                .current_input
                .binary_search(&(bus_idx as NeuronId))
                .is_ok();
            let weight = if in_pattern { 1 } else { WEIGHT_MIN };
            for &input in &col_inputs {
                net.connect_neurons(bus_neuron, input, weight, false);
            }
        }

        // Suppress the remaining free columns so this presentation cannot
        // allocate a second slot within the stabilization window.
        for col in &self.columns {
            if col.id != col_id && !col.allocated {
                net.inject_charge(col.output_neuron, ALLOCATION_SUPPRESSION);
            }
        }

        log::debug!(
            "[UKS] allocated column {} at tick {} ({} pattern indices, {} free left)",
            col_id,
            tick,
            self.current_input.len(),
            self.free_count()
        );
    }

    // ------------------------------------------------------------------
    // Probes
    // ------------------------------------------------------------------

    /// The column that claimed the most recent tick, if any.
    pub fn active_column(&self) -> Option<u32> {
        self.active_column
    }

    /// Did the Request neuron flag novelty in the most recent tick?
    pub fn did_request_fire(&self) -> bool {
        self.request_fired
    }

    pub fn allocated_count(&self) -> usize {
        self.columns.iter().filter(|col| col.allocated).count()
    }

    pub fn free_count(&self) -> usize {
        self.columns.len() - self.allocated_count()
    }

    pub fn column(&self, id: u32) -> Option<&CorticalColumn> {
        self.columns.get(id as usize)
    }

    pub fn columns(&self) -> &[CorticalColumn] {
        &self.columns
    }

    pub fn bus_neurons(&self) -> &[NeuronId] {
        &self.bus_neurons
    }

    pub fn request_neuron(&self) -> NeuronId {
        self.request_neuron
    }

    /// The pattern currently on the bus (sorted indices).
    pub fn current_pattern(&self) -> &[NeuronId] {
        &self.pattern
    }

    pub fn total_allocations(&self) -> usize {
        self.total_allocations
    }

    pub fn total_recognitions(&self) -> usize {
        self.total_recognitions
    }

    /// Serotonin-modulated search depth for graph traversal by
    /// collaborators: 3 hops when impulsive, up to 8 when patient.
    pub fn search_depth(&self, net: &Network) -> i32 {
        3 + (net.chemicals().serotonin / 20) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> UksConfig {
        UksConfig {
            num_columns: 3,
            bus_width: 16,
            enable_learning: true,
            stabilization_ticks: 2,
        }
    }

    fn build() -> (Network, Uks) {
        let mut net = Network::with_seed(2000, 40_000, 11);
        let uks = Uks::new(&mut net, small_config());
        (net, uks)
    }

    #[test]
    fn construction_counts() {
        let (net, uks) = build();
        assert_eq!(uks.allocated_count(), 0);
        assert_eq!(uks.free_count(), 3);
        assert_eq!(uks.bus_neurons().len(), 16);
        // Bus + 3 columns + request + global inhibitor.
        let expected = 16 + 3 * crate::column::COLUMN_TOTAL_NEURONS + 2;
        assert_eq!(net.neuron_count(), expected);
    }

    #[test]
    fn request_neuron_has_bus_and_column_fanin() {
        let (net, uks) = build();
        let request = uks.request_neuron();
        assert_eq!(net.synapse_weight(uks.bus_neurons()[0], request), 1);
        let output = uks.column(0).unwrap().output_neuron;
        assert_eq!(net.synapse_weight(output, request), WEIGHT_MIN);
        assert!(net.neuron_synapse_count(output) >= REQUEST_INHIBITION_EDGES);
    }

    #[test]
    fn present_primes_the_bus() {
        let (mut net, mut uks) = build();
        uks.present(&mut net, &[1, 3, 3, 99]); // dup and out-of-range dropped
        assert_eq!(uks.current_pattern(), &[1, 3]);
        assert_eq!(net.charge(uks.bus_neurons()[1]), BUS_PRIME_CHARGE);
        assert_eq!(net.charge(uks.bus_neurons()[3]), BUS_PRIME_CHARGE);
        assert_eq!(net.charge(uks.bus_neurons()[0]), 0);
    }

    #[test]
    fn allocation_wires_a_template() {
        let (mut net, mut uks) = build();
        uks.present(&mut net, &[0, 1, 2]);
        uks.allocate_column(&mut net, 0);

        assert_eq!(uks.allocated_count(), 1);
        assert_eq!(uks.free_count(), 2);
        let col = uks.column(0).unwrap();
        assert!(col.allocated);
        let input = col.input_neurons[0];
        // Members excite, non-members maximally inhibit.
        assert_eq!(net.synapse_weight(uks.bus_neurons()[0], input), 1);
        assert_eq!(net.synapse_weight(uks.bus_neurons()[5], input), WEIGHT_MIN);
        // Other free columns were suppressed.
        let other_output = uks.column(1).unwrap().output_neuron;
        assert_eq!(net.charge(other_output), ALLOCATION_SUPPRESSION);
    }

    #[test]
    fn search_depth_tracks_serotonin() {
        let (mut net, uks) = build();
        net.chemicals_mut().serotonin = 0;
        assert_eq!(uks.search_depth(&net), 3);
        net.chemicals_mut().serotonin = 100;
        assert_eq!(uks.search_depth(&net), 8);
    }

    #[test]
    fn reset_frees_columns_and_counters() {
        let (mut net, mut uks) = build();
        uks.present(&mut net, &[0, 1]);
        uks.allocate_column(&mut net, 0);
        uks.reset();
        assert_eq!(uks.allocated_count(), 0);
        assert_eq!(uks.total_allocations(), 0);
        assert!(uks.current_pattern().is_empty());
    }
}
