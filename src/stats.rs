//! Engine inspection and diagnostics.

use crate::chemistry::Neuromodulators;
use crate::network::Network;
use crate::types::Tick;
use crate::uks::Uks;

/// Summary statistics for a network.
#[derive(Clone, Debug)]
pub struct NetworkStats {
    pub n_neurons: usize,
    pub n_synapses: usize,
    pub tick: Tick,
    pub last_spike_count: usize,
    pub last_candidate_count: usize,
    pub mean_weight_magnitude: f32,
    pub mean_trace: f32,
    pub chemicals: Neuromodulators,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Network: {} neurons, {} synapses, tick {}",
            self.n_neurons, self.n_synapses, self.tick
        )?;
        writeln!(
            f,
            "  Spikes: {} fired / {} candidates last tick",
            self.last_spike_count, self.last_candidate_count
        )?;
        writeln!(
            f,
            "  Mean |weight|: {:.2}, mean trace: {:.2}",
            self.mean_weight_magnitude, self.mean_trace
        )?;
        writeln!(
            f,
            "  Chemicals: DA={} NE={} 5HT={} ACh={}",
            self.chemicals.dopamine,
            self.chemicals.norepinephrine,
            self.chemicals.serotonin,
            self.chemicals.acetylcholine
        )
    }
}

impl Network {
    pub fn stats(&self) -> NetworkStats {
        let mut weight_sum = 0i64;
        let mut trace_sum = 0i64;
        let mut count = 0usize;
        self.for_each_synapse(|syn| {
            weight_sum += syn.weight.unsigned_abs() as i64;
            trace_sum += syn.trace as i64;
            count += 1;
        });
        let denom = count.max(1) as f32;
        NetworkStats {
            n_neurons: self.neuron_count(),
            n_synapses: count,
            tick: self.current_tick(),
            last_spike_count: self.last_spike_count(),
            last_candidate_count: self.last_candidate_count(),
            mean_weight_magnitude: weight_sum as f32 / denom,
            mean_trace: trace_sum as f32 / denom,
            chemicals: self.chemicals(),
        }
    }
}

/// Summary statistics for a knowledge store.
#[derive(Clone, Debug)]
pub struct UksStats {
    pub n_columns: usize,
    pub allocated: usize,
    pub free: usize,
    pub total_allocations: usize,
    pub total_recognitions: usize,
    pub active_column: Option<u32>,
}

impl std::fmt::Display for UksStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "UKS: {}/{} columns allocated ({} free)",
            self.allocated, self.n_columns, self.free
        )?;
        writeln!(
            f,
            "  Allocations: {}, recognitions: {}, active: {:?}",
            self.total_allocations, self.total_recognitions, self.active_column
        )
    }
}

impl Uks {
    pub fn stats(&self) -> UksStats {
        UksStats {
            n_columns: self.columns().len(),
            allocated: self.allocated_count(),
            free: self.free_count(),
            total_allocations: self.total_allocations(),
            total_recognitions: self.total_recognitions(),
            active_column: self.active_column(),
        }
    }
}
