//! Motor interface — plastic bus-to-motor-neuron template.
//!
//! A thin output layer: N motor neurons wired from the recognition bus with
//! plastic weight-0 synapses (tabula rasa). Associations form through
//! conditioning — a bus pattern fires, the coach forces an action, STDP
//! strengthens the causal edges — until the pattern alone triggers the
//! action. Exploration injects spontaneous motor activity so operant
//! learning has actions to assign credit to.

use crate::network::Network;
use crate::prng::Lcg;
use crate::types::{Charge, NeuronId, Weight};

#[derive(Clone, Debug)]
pub struct MotorConfig {
    pub threshold: Charge,
    pub leak: Charge,
    pub refractory: i32,
    /// Seed for the exploration stream. No global RNG anywhere.
    pub exploration_seed: u64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            threshold: 8,
            leak: 2,
            refractory: 3,
            exploration_seed: 0x6D6F_746F,
        }
    }
}

pub struct MotorInterface {
    motors: Vec<NeuronId>,
    /// Recorded (source, motor) pairs per action, for weight probes.
    sources: Vec<Vec<NeuronId>>,
    rng: Lcg,
}

impl MotorInterface {
    /// Create `n_actions` motor neurons in `net`.
    pub fn new(net: &mut Network, n_actions: usize, config: MotorConfig) -> Self {
        let motors = (0..n_actions)
            .map(|_| net.add_neuron(config.threshold, config.leak, config.refractory))
            .collect();
        Self {
            motors,
            sources: vec![Vec::new(); n_actions],
            rng: Lcg::new(config.exploration_seed),
        }
    }

    /// Wire every bus neuron to every motor neuron with a plastic weight-0
    /// synapse. Learning differentiates which edges strengthen.
    pub fn connect_bus(&mut self, net: &mut Network, bus_neurons: &[NeuronId]) {
        for &bus in bus_neurons {
            for (action, &motor) in self.motors.iter().enumerate() {
                if net.connect_neurons(bus, motor, 0, true) {
                    self.sources[action].push(bus);
                }
            }
        }
    }

    /// Let a concept column drive an action directly.
    pub fn connect_column(
        &mut self,
        net: &mut Network,
        column_output: NeuronId,
        action: usize,
        initial_weight: Weight,
    ) {
        if let Some(&motor) = self.motors.get(action) {
            if net.connect_neurons(column_output, motor, initial_weight, true) {
                self.sources[action].push(column_output);
            }
        }
    }

    /// The coach: stimulate a motor neuron directly, creating the
    /// post-synaptic spike that conditioning needs.
    pub fn force_action(&self, net: &mut Network, action: usize, amount: Charge) {
        if let Some(&motor) = self.motors.get(action) {
            net.inject_charge(motor, amount);
        }
    }

    /// Spontaneous motor activity: with probability `rate`/100 per motor,
    /// inject `amount` charge. Essential for operant learning — untried
    /// actions can never be rewarded.
    pub fn explore(&mut self, net: &mut Network, rate: u32, amount: Charge) {
        for &motor in &self.motors {
            if self.rng.next_u32() % 100 < rate {
                net.inject_charge(motor, amount);
            }
        }
    }

    /// The action whose motor neuron fired this tick, lowest index first.
    pub fn action(&self, net: &Network) -> Option<usize> {
        self.motors.iter().position(|&m| net.did_fire(m))
    }

    pub fn did_fire(&self, net: &Network, action: usize) -> bool {
        self.motors.get(action).is_some_and(|&m| net.did_fire(m))
    }

    pub fn charge(&self, net: &Network, action: usize) -> Charge {
        self.motors.get(action).map_or(0, |&m| net.charge(m))
    }

    pub fn motor_neuron(&self, action: usize) -> Option<NeuronId> {
        self.motors.get(action).copied()
    }

    pub fn action_count(&self) -> usize {
        self.motors.len()
    }

    /// Total learned weight into one motor neuron — a cheap measure of how
    /// strongly the bus has been associated with the action.
    pub fn total_weight(&self, net: &Network, action: usize) -> i32 {
        match self.motors.get(action) {
            Some(&motor) => self.sources[action]
                .iter()
                .map(|&src| net.synapse_weight(src, motor) as i32)
                .sum(),
            None => 0,
        }
    }

    pub fn mean_weight(&self, net: &Network, action: usize) -> f32 {
        let count = self.sources.get(action).map_or(0, Vec::len);
        if count == 0 {
            return 0.0;
        }
        self.total_weight(net, action) as f32 / count as f32
    }
}
