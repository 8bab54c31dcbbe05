//! # corticore
//!
//! Integer-only, tick-scheduled spiking neural engine with a homeostatic
//! knowledge store.
//!
//! The core is a population of LIF (Leaky Integrate-and-Fire) neurons over
//! a dual-region synapse arena, advanced by a four-phase tick (leak,
//! integrate, fire, learn) with spikes visible exactly one tick after
//! emission. Sparsity is enforced by a k-WTA "Razor" that lets only the K
//! strongest candidates fire; credit assignment runs either as immediate
//! STDP (Pavlovian) or as eligibility traces consumed by delayed rewards
//! (operant). A four-channel neuromodulator vector (dopamine,
//! norepinephrine, serotonin, acetylcholine) gates learning, thresholds,
//! leak, and input gain, with a panic reset when arousal saturates.
//!
//! On top of the network sits the Universal Knowledge Store: a recognition
//! bus broadcast to a pool of fixed-topology cortical columns, a Request
//! neuron that detects novelty, and a winner-take-all circuit that
//! allocates a free column to a novel pattern in one shot.
//!
//! Everything is deterministic for a fixed seed and command sequence —
//! noise derives from `(tick, neuron_id, seed)`, never from a shared RNG —
//! and the data-parallel phases use static partitioning so thread count
//! does not change results.

pub mod bits;
pub mod chemistry;
pub mod column;
pub mod motor;
pub mod network;
pub mod neuron;
pub mod prng;
pub mod spike_queue;
pub mod stats;
pub mod synapse;
pub mod types;
pub mod uks;

#[cfg(test)]
mod scenario_test;

pub use chemistry::Neuromodulators;
pub use column::CorticalColumn;
pub use motor::{MotorConfig, MotorInterface};
pub use network::Network;
pub use neuron::Neuron;
pub use spike_queue::SpikeQueue;
pub use stats::{NetworkStats, UksStats};
pub use synapse::{stdp_delta, Synapse, SynapseArena};
pub use types::{Charge, NeuronId, Tick, Weight};
pub use uks::{Uks, UksConfig};
