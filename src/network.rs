//! Network — the arena owner and the four-phase tick loop.
//!
//! The network owns every neuron, synapse, the spike queue, the refractory
//! bitmap, and the neuromodulator vector. External code holds opaque ids
//! only. One call to [`Network::step`] executes, in order:
//!
//! 1. housekeeping — rotate the fired-sets, rebuild the refractory bitmap
//! 2. leakage — `V = max(0, V - (leak + serotonin/10))` for non-refractory
//!    neurons (data-parallel above [`PARALLEL_THRESHOLD`])
//! 3. integration — deliver spikes emitted at `t - 1`; refractory targets
//!    absorb nothing (sequential: scattered writes to target charges)
//! 4. firing — effective threshold `max(1, theta - NE/5 + noise)` with
//!    NE-gated exploration noise, then the k-WTA Razor keeps the top K
//!    candidates by charge (losers retain their charge)
//! 5. plasticity — STDP (Pavlovian) or eligibility tagging (operant),
//!    gated by the plasticity flag and dopamine >= 10
//! 6. eligibility decay (operant mode only, after plasticity)
//! 7. chemical homeostasis — one decay step toward baseline
//! 8. panic reset when norepinephrine saturates at 95+
//!
//! Spikes emitted at tick `t` become visible to targets exactly at `t + 1`.
//! Determinism: for a fixed seed and command sequence the tick is bit-exact
//! reproducible regardless of thread count — all noise derives from
//! `(tick, neuron_id, seed)` and parallel phases use static partitioning.
//!
//! Nothing here returns errors: out-of-range ids degrade to silent no-ops
//! so a running experiment never fails mid-tick (`connect_neurons` alone
//! reports success as a bool).

use rayon::prelude::*;

use crate::bits::BitSet;
use crate::chemistry::Neuromodulators;
use crate::neuron::Neuron;
use crate::prng::{tick_noise, Lcg};
use crate::spike_queue::SpikeQueue;
use crate::synapse::{Synapse, SynapseArena};
use crate::types::{Charge, NeuronId, Tick, Weight, CHARGE_MIN};

/// Norepinephrine level at which the startle interrupt triggers.
pub const PANIC_NE: i8 = 95;
/// Post-panic norepinephrine: still aroused, out of panic territory.
pub const POST_PANIC_NE: i8 = 70;
/// Dopamine floor below which the plasticity phase is skipped entirely.
pub const PLASTICITY_DA_GATE: i8 = 10;
/// Default k-WTA cap on spikes per tick.
pub const DEFAULT_MAX_SPIKES_PER_TICK: usize = 1000;
/// Population size at which leakage and the candidate scan go parallel.
pub const PARALLEL_THRESHOLD: usize = 100_000;
/// Static chunk size for the parallel phases. Fixed so that partitioning
/// (and therefore output) does not depend on the worker count.
pub const PARALLEL_CHUNK: usize = 4096;

const DEFAULT_SEED: u64 = 0xC0DE_5EED_2B5F_11E7;

pub struct Network {
    current_tick: Tick,
    plasticity_enabled: bool,
    operant_mode: bool,
    razor_enabled: bool,
    max_spikes_per_tick: usize,
    last_candidate_count: usize,

    chemicals: Neuromodulators,

    neurons: Vec<Neuron>,
    synapses: SynapseArena,
    queue: SpikeQueue,

    /// Neurons that fired during the most recent completed step, ascending
    /// by id so iteration order is reproducible.
    fired_this_tick: Vec<NeuronId>,
    fired_bits: BitSet,
    fired_last_tick: Vec<NeuronId>,
    fired_last_bits: BitSet,

    /// Rebuilt once at the start of every tick; O(1) refractory checks
    /// during integration without touching the neuron struct.
    refractory_bits: BitSet,

    seed: u64,
    noise_rng: Lcg,
    hidden_noise_rng: Lcg,
}

impl Network {
    /// Create a network with capacity hints. Arenas grow past the hints
    /// without error.
    pub fn new(neuron_capacity: usize, synapse_capacity: usize) -> Self {
        Self::with_seed(neuron_capacity, synapse_capacity, DEFAULT_SEED)
    }

    /// Create a network with an explicit root seed for every pseudo-random
    /// stream (firing noise, noise injection). Two networks built with the
    /// same seed and fed the same commands stay bit-identical.
    pub fn with_seed(neuron_capacity: usize, synapse_capacity: usize, seed: u64) -> Self {
        Self {
            current_tick: 0,
            plasticity_enabled: true,
            operant_mode: false,
            razor_enabled: true,
            max_spikes_per_tick: DEFAULT_MAX_SPIKES_PER_TICK,
            last_candidate_count: 0,
            chemicals: Neuromodulators::default(),
            neurons: Vec::with_capacity(neuron_capacity),
            synapses: SynapseArena::with_capacity(synapse_capacity),
            queue: SpikeQueue::new(),
            fired_this_tick: Vec::new(),
            fired_bits: BitSet::with_capacity(neuron_capacity),
            fired_last_tick: Vec::new(),
            fired_last_bits: BitSet::with_capacity(neuron_capacity),
            refractory_bits: BitSet::with_capacity(neuron_capacity),
            seed,
            noise_rng: Lcg::new(seed ^ 0x9E3779B97F4A7C15),
            hidden_noise_rng: Lcg::new(seed ^ 0xD1B54A32D192ED03),
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Add a neuron, returning its id. Must not be called mid-step (the
    /// borrow checker enforces this; there is no runtime guard).
    pub fn add_neuron(&mut self, threshold: Charge, leak: Charge, refractory: i32) -> NeuronId {
        let id = self.neurons.len() as NeuronId;
        self.neurons.push(Neuron::new(threshold, leak, refractory));
        let n = self.neurons.len();
        self.fired_bits.grow_to(n);
        self.fired_last_bits.grow_to(n);
        self.refractory_bits.grow_to(n);
        id
    }

    /// Connect `from` to `to`. The weight is clamped to `[-16, +16]`.
    /// Returns false when either id is out of range.
    ///
    /// The synapse lands in the contiguous arena while `from`'s window is
    /// still the arena suffix; otherwise it goes to the overflow row and
    /// stays there for good.
    pub fn connect_neurons(
        &mut self,
        from: NeuronId,
        to: NeuronId,
        weight: Weight,
        plastic: bool,
    ) -> bool {
        let n = self.neurons.len();
        if from as usize >= n || to as usize >= n {
            return false;
        }
        let syn = Synapse::new(to, weight, plastic);
        let pre = &mut self.neurons[from as usize];
        if pre.synapse_count < u16::MAX
            && self.synapses.can_extend(pre.synapse_base, pre.synapse_count)
        {
            let idx = self.synapses.push_contiguous(syn);
            if pre.synapse_count == 0 {
                pre.synapse_base = idx;
            }
            pre.synapse_count += 1;
        } else {
            self.synapses.push_overflow(from, syn);
        }
        true
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Advance the network by one tick. See the module docs for the phase
    /// order; observable effects are the updated arenas, queue, chemicals,
    /// fired-set, and `current_tick + 1`.
    pub fn step(&mut self) {
        // 1. Housekeeping: rotate fired-sets, rebuild the refractory bitmap.
        std::mem::swap(&mut self.fired_last_tick, &mut self.fired_this_tick);
        self.fired_this_tick.clear();
        std::mem::swap(&mut self.fired_last_bits, &mut self.fired_bits);
        self.fired_bits.clear_all();
        self.rebuild_refractory_bits();

        // 2-4. The membrane phases.
        self.leakage_phase();
        self.integration_phase();
        self.firing_phase();

        // 5. Plasticity, gated globally and by dopamine.
        if self.plasticity_enabled {
            self.plasticity_phase();
        }

        // 6. Trace decay happens after plasticity so fresh tags don't lose
        // a step immediately.
        if self.operant_mode {
            self.synapses.for_each_mut(|syn| syn.decay_trace());
        }

        // 7. Chemical homeostasis.
        self.chemicals.decay();

        // 8. Startle interrupt.
        if self.chemicals.norepinephrine >= PANIC_NE {
            self.panic_reset();
        }

        self.current_tick += 1;
    }

    /// Run `n` consecutive steps.
    pub fn run(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Return to tick zero: clears the queue and both fired-sets, resets
    /// every neuron's membrane and firing history. Synapses, weights, and
    /// chemicals are preserved. This is the short-term-memory wipe used
    /// between presentations and by consolidation hosts.
    pub fn reset(&mut self) {
        self.current_tick = 0;
        self.queue.clear();
        self.fired_this_tick.clear();
        self.fired_bits.clear_all();
        self.fired_last_tick.clear();
        self.fired_last_bits.clear_all();
        for neuron in self.neurons.iter_mut() {
            neuron.reset();
        }
    }

    // ------------------------------------------------------------------
    // External input
    // ------------------------------------------------------------------

    /// Force a spike: enqueue at the current tick and record the neuron as
    /// fired, as if it had crossed threshold externally. Out-of-range ids
    /// are ignored.
    pub fn inject_spike(&mut self, neuron: NeuronId) {
        if (neuron as usize) < self.neurons.len() {
            self.queue.push(neuron, self.current_tick);
            self.neurons[neuron as usize].last_fired = self.current_tick;
            self.record_fired(neuron);
        }
    }

    /// Add raw charge (possibly negative). No clamping here — the leak and
    /// firing phases own the membrane bounds. Out-of-range ids are ignored.
    pub fn inject_charge(&mut self, neuron: NeuronId, amount: Charge) {
        if let Some(n) = self.neurons.get_mut(neuron as usize) {
            n.add_charge(amount);
        }
    }

    /// The dopamine flood: apply `reward` to every plastic synapse with a
    /// live eligibility trace, then clear the traces.
    pub fn inject_reward(&mut self, reward: i32) {
        self.synapses.for_each_mut(|syn| syn.apply_reward(reward));
    }

    /// Stochastic resonance: add a per-neuron value in `[-amplitude,
    /// +amplitude]` to every membrane. Draws come from the network's own
    /// seeded stream, never a process-wide RNG.
    pub fn inject_noise(&mut self, amplitude: i32) {
        let Self {
            neurons, noise_rng, ..
        } = self;
        for neuron in neurons.iter_mut() {
            neuron.add_charge(noise_rng.symmetric(amplitude));
        }
    }

    /// Noise for hidden layers only: `exclude` lists input-owned neurons
    /// (e.g. a retina) whose signal must not be corrupted. Excluded neurons
    /// do not consume draws, and this variant has its own stream.
    pub fn inject_noise_to_hidden(&mut self, amplitude: i32, exclude: &[NeuronId]) {
        let mut skip = BitSet::with_capacity(self.neurons.len());
        for &id in exclude {
            if (id as usize) < self.neurons.len() {
                skip.set(id);
            }
        }
        let Self {
            neurons,
            hidden_noise_rng,
            ..
        } = self;
        for (id, neuron) in neurons.iter_mut().enumerate() {
            if skip.contains(id as NeuronId) {
                continue;
            }
            neuron.add_charge(hidden_noise_rng.symmetric(amplitude));
        }
    }

    // ------------------------------------------------------------------
    // Chemistry
    // ------------------------------------------------------------------

    pub fn spike_dopamine(&mut self, amount: i8) {
        self.chemicals.spike_dopamine(amount);
    }

    pub fn spike_norepinephrine(&mut self, amount: i8) {
        self.chemicals.spike_norepinephrine(amount);
    }

    pub fn spike_serotonin(&mut self, amount: i8) {
        self.chemicals.spike_serotonin(amount);
    }

    pub fn spike_acetylcholine(&mut self, amount: i8) {
        self.chemicals.spike_acetylcholine(amount);
    }

    /// Reward event: spike dopamine, and in operant mode also flush the
    /// scaled reward into eligible synapses.
    pub fn reward_signal(&mut self, amount: i8) {
        self.chemicals.spike_dopamine(amount);
        if self.operant_mode {
            self.inject_reward(amount as i32 / 10);
        }
    }

    /// Surprise event: spike norepinephrine, lowering effective thresholds.
    pub fn surprise_signal(&mut self, amount: i8) {
        self.chemicals.spike_norepinephrine(amount);
    }

    /// Calm event: spike serotonin, draining charge faster.
    pub fn calm_signal(&mut self, amount: i8) {
        self.chemicals.spike_serotonin(amount);
    }

    /// Current chemical levels `(DA, NE, 5-HT, ACh)` as a value.
    pub fn chemicals(&self) -> Neuromodulators {
        self.chemicals
    }

    /// Mutable chemical access for hosts that drive regimes directly
    /// (the knowledge store's homeostatic loop, consolidation schedulers).
    pub fn chemicals_mut(&mut self) -> &mut Neuromodulators {
        &mut self.chemicals
    }

    /// Restore a previously saved chemical state (consolidation hook).
    pub fn set_chemicals(&mut self, chemicals: Neuromodulators) {
        self.chemicals = chemicals;
        self.chemicals.clamp();
    }

    /// The startle interrupt: zero every membrane, drop all pending spikes
    /// and firing records, and pull norepinephrine back to 70. Runs
    /// automatically when NE reaches 95; hosts may force it.
    pub fn panic_reset(&mut self) {
        log::warn!(
            "[PANIC] startle reset at tick {} (NE={})",
            self.current_tick,
            self.chemicals.norepinephrine
        );
        for neuron in self.neurons.iter_mut() {
            neuron.charge = 0;
        }
        self.queue.clear();
        self.fired_this_tick.clear();
        self.fired_bits.clear_all();
        self.fired_last_tick.clear();
        self.fired_last_bits.clear_all();
        self.chemicals.norepinephrine = POST_PANIC_NE;
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn set_plasticity_enabled(&mut self, enabled: bool) {
        self.plasticity_enabled = enabled;
    }

    pub fn is_plasticity_enabled(&self) -> bool {
        self.plasticity_enabled
    }

    /// true = eligibility traces + reward (operant), false = immediate
    /// STDP (Pavlovian).
    pub fn set_operant_mode(&mut self, enabled: bool) {
        self.operant_mode = enabled;
    }

    pub fn is_operant_mode(&self) -> bool {
        self.operant_mode
    }

    pub fn set_razor_enabled(&mut self, enabled: bool) {
        self.razor_enabled = enabled;
    }

    pub fn is_razor_enabled(&self) -> bool {
        self.razor_enabled
    }

    /// Set k in k-WTA: the per-tick spike cap.
    pub fn set_max_spikes_per_tick(&mut self, k: usize) {
        self.max_spikes_per_tick = k;
    }

    pub fn max_spikes_per_tick(&self) -> usize {
        self.max_spikes_per_tick
    }

    // ------------------------------------------------------------------
    // Probes (read-only, between ticks)
    // ------------------------------------------------------------------

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// Did this neuron fire during the most recent completed step?
    pub fn did_fire(&self, neuron: NeuronId) -> bool {
        self.fired_bits.contains(neuron)
    }

    /// Membrane charge; 0 for out-of-range ids.
    pub fn charge(&self, neuron: NeuronId) -> Charge {
        self.neurons
            .get(neuron as usize)
            .map_or(0, |n| n.charge)
    }

    /// Neurons that fired in the most recent step, ascending by id.
    pub fn fired_this_tick(&self) -> &[NeuronId] {
        &self.fired_this_tick
    }

    pub fn last_spike_count(&self) -> usize {
        self.fired_this_tick.len()
    }

    /// How many neurons wanted to fire before the Razor, last tick.
    pub fn last_candidate_count(&self) -> usize {
        self.last_candidate_count
    }

    /// Spikes still queued for integration.
    pub fn pending_spike_count(&self) -> usize {
        self.queue.len()
    }

    /// Weight of the synapse `from -> to`, or 0 when none exists.
    pub fn synapse_weight(&self, from: NeuronId, to: NeuronId) -> Weight {
        match self.neurons.get(from as usize) {
            Some(pre) => self
                .synapses
                .outgoing(pre.synapse_base, pre.synapse_count, from)
                .find(|syn| syn.target == to)
                .map_or(0, |syn| syn.weight),
            None => 0,
        }
    }

    /// Outgoing synapse count (contiguous + overflow) for one neuron.
    pub fn neuron_synapse_count(&self, neuron: NeuronId) -> usize {
        match self.neurons.get(neuron as usize) {
            Some(n) => n.synapse_count as usize + self.synapses.overflow_count(neuron),
            None => 0,
        }
    }

    /// Read-only sweep over every synapse, for stats and invariants.
    pub fn for_each_synapse(&self, f: impl FnMut(&Synapse)) {
        self.synapses.for_each(f);
    }

    // ------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------

    fn rebuild_refractory_bits(&mut self) {
        self.refractory_bits.clear_all();
        let tick = self.current_tick;
        for (id, neuron) in self.neurons.iter().enumerate() {
            if neuron.is_refractory(tick) {
                self.refractory_bits.set(id as NeuronId);
            }
        }
    }

    /// Phase 2: leak every non-refractory membrane. The serotonin bonus
    /// (`5-HT / 10`) is the "patience" term — high serotonin drains charge
    /// faster. Embarrassingly parallel; each worker owns a static chunk.
    fn leakage_phase(&mut self) {
        let bonus = (self.chemicals.serotonin / 10) as Charge;
        let tick = self.current_tick;

        if self.neurons.len() >= PARALLEL_THRESHOLD {
            self.neurons
                .par_chunks_mut(PARALLEL_CHUNK)
                .for_each(|chunk| {
                    for neuron in chunk {
                        if !neuron.is_refractory(tick) {
                            neuron.apply_leak(bonus);
                        }
                    }
                });
        } else {
            for neuron in self.neurons.iter_mut() {
                if !neuron.is_refractory(tick) {
                    neuron.apply_leak(bonus);
                }
            }
        }
    }

    /// Phase 3: deliver last tick's spikes. Sequential on purpose — the
    /// scattered writes to target charges contend under parallel execution
    /// and lose the cache-locality of the contiguous arena walk.
    fn integration_phase(&mut self) {
        let spikes = self.queue.take_at(self.current_tick - 1);
        let Self {
            neurons,
            synapses,
            refractory_bits,
            ..
        } = self;
        let n = neurons.len();

        for pre_id in spikes {
            if pre_id as usize >= n {
                continue;
            }
            let (base, count) = {
                let pre = &neurons[pre_id as usize];
                (pre.synapse_base, pre.synapse_count)
            };
            for syn in synapses.outgoing(base, count, pre_id) {
                let target = syn.target as usize;
                // Refractory targets absorb nothing.
                if target < n && !refractory_bits.contains(syn.target) {
                    neurons[target].add_charge(syn.weight as Charge);
                }
            }
        }
    }

    /// Phase 4: collect candidates against the NE-modulated effective
    /// threshold, then apply the Razor.
    ///
    /// Noise amplitude is `max(0, (NE - 60) / 4)` — zero (fully
    /// deterministic) until norepinephrine exceeds 60, then simulated
    /// annealing for escaping local minima. Each neuron's draw comes from
    /// `tick_noise(seed, tick, id, ..)` so the parallel scan is exact.
    fn firing_phase(&mut self) {
        let tick = self.current_tick;
        let seed = self.seed;
        let reduction = (self.chemicals.norepinephrine / 5) as Charge;
        let amplitude = ((self.chemicals.norepinephrine as i32 - 60) / 4).max(0);

        let collect = |id: NeuronId, neuron: &mut Neuron| -> Option<(Charge, NeuronId)> {
            if neuron.is_refractory(tick) {
                return None;
            }
            // Inhibition during integration may have pushed the membrane
            // negative; the floor is restored here, outside firing.
            if neuron.charge < CHARGE_MIN {
                neuron.charge = CHARGE_MIN;
            }
            let mut effective = neuron.threshold - reduction;
            if amplitude > 0 {
                effective += tick_noise(seed, tick, id, amplitude);
            }
            if effective < 1 {
                effective = 1;
            }
            if neuron.charge >= effective {
                Some((neuron.charge, id))
            } else {
                None
            }
        };

        let mut candidates: Vec<(Charge, NeuronId)> = if self.neurons.len() >= PARALLEL_THRESHOLD {
            // Thread-local gathering over static chunks, merged in chunk
            // order by the indexed collect — bit-identical to sequential.
            self.neurons
                .par_chunks_mut(PARALLEL_CHUNK)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    let start = (chunk_idx * PARALLEL_CHUNK) as NeuronId;
                    let mut local = Vec::new();
                    for (offset, neuron) in chunk.iter_mut().enumerate() {
                        if let Some(c) = collect(start + offset as NeuronId, neuron) {
                            local.push(c);
                        }
                    }
                    local
                })
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            self.neurons
                .iter_mut()
                .enumerate()
                .filter_map(|(id, neuron)| collect(id as NeuronId, neuron))
                .collect()
        };

        self.last_candidate_count = candidates.len();

        // The Razor: keep the K strongest candidates, descending by charge,
        // ties to the smaller id. Partial selection, no full sort. Losers
        // keep their charge and may win a later tick.
        if self.razor_enabled && candidates.len() > self.max_spikes_per_tick {
            let k = self.max_spikes_per_tick;
            candidates.select_nth_unstable_by(k, |a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            candidates.truncate(k);
        }

        // Fire the winners in id order so the fired-set stays sorted.
        let mut winners: Vec<NeuronId> = candidates.into_iter().map(|(_, id)| id).collect();
        winners.sort_unstable();
        for id in winners {
            let neuron = &mut self.neurons[id as usize];
            neuron.charge = 0;
            neuron.last_fired = tick;
            self.queue.push(id, tick);
            self.fired_this_tick.push(id);
            self.fired_bits.set(id);
        }
    }

    /// Phase 5: spike-timing plasticity over the fired-sets.
    ///
    /// LTP sweeps pre-neurons that fired last tick and touches only the
    /// synapses whose target fired this tick — O(spikes x fan-out), never
    /// an all-pairs scan. Pavlovian mode additionally sweeps this tick's
    /// pre-neurons for targets that fired last tick (LTD); operant mode
    /// leaves depression to negative rewards.
    fn plasticity_phase(&mut self) {
        if self.chemicals.dopamine < PLASTICITY_DA_GATE {
            return;
        }
        let operant = self.operant_mode;
        let Self {
            neurons,
            synapses,
            fired_this_tick,
            fired_last_tick,
            fired_bits,
            fired_last_bits,
            ..
        } = self;
        let n = neurons.len();
        let mut ltp = 0usize;
        let mut ltd = 0usize;

        for &pre_id in fired_last_tick.iter() {
            if pre_id as usize >= n {
                continue;
            }
            let (base, count, pre_fired) = {
                let pre = &neurons[pre_id as usize];
                (pre.synapse_base, pre.synapse_count, pre.last_fired)
            };
            for syn in synapses.outgoing_mut(base, count, pre_id) {
                if !syn.plastic || (syn.target as usize) >= n || !fired_bits.contains(syn.target) {
                    continue;
                }
                let post_fired = neurons[syn.target as usize].last_fired;
                if operant {
                    syn.mark_eligible(pre_fired, post_fired);
                } else {
                    syn.apply_stdp(pre_fired, post_fired);
                }
                ltp += 1;
            }
        }

        if !operant {
            for &pre_id in fired_this_tick.iter() {
                if pre_id as usize >= n {
                    continue;
                }
                let (base, count, pre_fired) = {
                    let pre = &neurons[pre_id as usize];
                    (pre.synapse_base, pre.synapse_count, pre.last_fired)
                };
                for syn in synapses.outgoing_mut(base, count, pre_id) {
                    if !syn.plastic
                        || (syn.target as usize) >= n
                        || !fired_last_bits.contains(syn.target)
                    {
                        continue;
                    }
                    // Post-before-pre: apply_stdp sees the negative delta
                    // and depresses (or ignores outside the window).
                    let post_fired = neurons[syn.target as usize].last_fired;
                    syn.apply_stdp(pre_fired, post_fired);
                    ltd += 1;
                }
            }
        }

        if ltp > 0 || ltd > 0 {
            log::debug!(
                "[PLASTICITY] tick {}: {} potentiation pairings, {} depression pairings",
                self.current_tick,
                ltp,
                ltd
            );
        }
    }

    /// Insert into the sorted fired-set, keeping the bitmap in sync.
    fn record_fired(&mut self, neuron: NeuronId) {
        if !self.fired_bits.contains(neuron) {
            let pos = self.fired_this_tick.partition_point(|&id| id < neuron);
            self.fired_this_tick.insert(pos, neuron);
            self.fired_bits.set(neuron);
        }
    }
}
