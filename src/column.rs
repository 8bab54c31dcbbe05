//! Cortical column — a fixed-topology neuron cluster representing one
//! learned concept.

use crate::network::Network;
use crate::types::{Charge, NeuronId, Tick, INVALID_NEURON};

/// Input neurons receiving the recognition bus per column.
pub const COLUMN_INPUT_NEURONS: usize = 20;
/// Pyramidal (main processing) neurons per column.
pub const COLUMN_PYRAMIDAL_NEURONS: usize = 50;
/// Total neurons per column, counting the output and inhibitory pair.
pub const COLUMN_TOTAL_NEURONS: usize = COLUMN_INPUT_NEURONS + COLUMN_PYRAMIDAL_NEURONS + 2;

// Neuron parameters, tuned for reliable recognition.
pub const COLUMN_INPUT_THRESHOLD: Charge = 3;
pub const COLUMN_PYRAMIDAL_THRESHOLD: Charge = 5;
/// The output needs many pyramidals converging to cross this.
pub const COLUMN_OUTPUT_THRESHOLD: Charge = 8;
pub const COLUMN_INHIBITORY_THRESHOLD: Charge = 3;

/// One concept slot: input layer, pyramidal cluster, a single output neuron,
/// and a local inhibitory interneuron. Wiring is fixed at construction; only
/// the recognition weights from the bus are added later, exactly once, when
/// the column is allocated.
#[derive(Clone, Debug)]
pub struct CorticalColumn {
    pub id: u32,
    pub input_neurons: Vec<NeuronId>,
    pub pyramidal_neurons: Vec<NeuronId>,
    /// Fires when the column recognises the bus pattern.
    pub output_neuron: NeuronId,
    pub inhibitory_neuron: NeuronId,

    /// Whether this column currently represents a concept.
    pub allocated: bool,
    /// Whether the output neuron fired in the current tick.
    pub active: bool,
    /// Temporary excitatory priming applied to the input layer.
    pub boost: Charge,

    pub allocated_at: Tick,
    pub activation_count: u32,
}

impl CorticalColumn {
    pub fn new(
        id: u32,
        input_neurons: Vec<NeuronId>,
        pyramidal_neurons: Vec<NeuronId>,
        output_neuron: NeuronId,
        inhibitory_neuron: NeuronId,
    ) -> Self {
        Self {
            id,
            input_neurons,
            pyramidal_neurons,
            output_neuron,
            inhibitory_neuron,
            allocated: false,
            active: false,
            boost: 0,
            allocated_at: 0,
            activation_count: 0,
        }
    }

    /// Return to the free state. The neurons and any learned recognition
    /// weights remain in the network.
    pub fn reset(&mut self) {
        self.allocated = false;
        self.active = false;
        self.boost = 0;
        self.allocated_at = 0;
        self.activation_count = 0;
    }

    /// Priming: pour the boost charge into the input layer.
    pub fn apply_boost(&self, net: &mut Network) {
        if self.boost > 0 {
            for &input in &self.input_neurons {
                net.inject_charge(input, self.boost);
            }
        }
    }

    /// Did the output neuron fire in the most recent step?
    pub fn check_active(&self, net: &Network) -> bool {
        net.did_fire(self.output_neuron)
    }

    pub fn neuron_count(&self) -> usize {
        self.input_neurons.len() + self.pyramidal_neurons.len() + 2
    }
}

impl Default for CorticalColumn {
    fn default() -> Self {
        Self::new(0, Vec::new(), Vec::new(), INVALID_NEURON, INVALID_NEURON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_primes_the_input_layer() {
        let mut net = Network::new(4, 0);
        let inputs = vec![net.add_neuron(3, 1, 2), net.add_neuron(3, 1, 2)];
        let output = net.add_neuron(8, 0, 2);
        let inhibitory = net.add_neuron(3, 0, 2);
        let mut col = CorticalColumn::new(0, inputs, vec![], output, inhibitory);

        col.apply_boost(&mut net);
        assert_eq!(net.charge(col.input_neurons[0]), 0, "no boost set yet");

        col.boost = 4;
        col.apply_boost(&mut net);
        assert_eq!(net.charge(col.input_neurons[0]), 4);
        assert_eq!(net.charge(col.input_neurons[1]), 4);
        assert_eq!(net.charge(col.output_neuron), 0, "boost targets inputs only");
    }

    #[test]
    fn reset_frees_the_column() {
        let mut col = CorticalColumn::new(3, vec![0, 1], vec![2, 3, 4], 5, 6);
        col.allocated = true;
        col.active = true;
        col.allocated_at = 42;
        col.activation_count = 7;
        col.reset();
        assert!(!col.allocated);
        assert!(!col.active);
        assert_eq!(col.allocated_at, 0);
        assert_eq!(col.activation_count, 0);
        // Membership is structural, not state.
        assert_eq!(col.neuron_count(), 7);
    }
}
