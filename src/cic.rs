//! Integrator-comb decimator used as the window accumulator of the device
//! model. A single stage over raw 0/1 bits is an exact boxcar: the comb output
//! at each decimation boundary is the ones count of the window just closed.

pub const MAX_STAGES: usize = 8;

pub struct CicFilter {
    stages: usize,
    decimation: usize,
    integrator: [i64; MAX_STAGES],
    comb: [i64; MAX_STAGES],
    pos: usize,
}

impl CicFilter {
    pub fn new(stages: usize, decimation: usize) -> Self {
        assert!(stages >= 1 && stages <= MAX_STAGES);
        assert!(decimation >= 2);
        Self {
            stages,
            decimation,
            integrator: [0; MAX_STAGES],
            comb: [0; MAX_STAGES],
            pos: 0,
        }
    }

    /// Samples accepted since the last decimation boundary.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self) {
        self.integrator = [0; MAX_STAGES];
        self.comb = [0; MAX_STAGES];
        self.pos = 0;
    }

    /// Push one input sample. Calls `output` with the comb result whenever a
    /// full decimation window has been accepted.
    pub fn push_sample<F>(&mut self, value: i64, mut output: F)
    where
        F: FnMut(i64),
    {
        let mut x = value;
        for stage in 0..self.stages {
            self.integrator[stage] = self.integrator[stage].wrapping_add(x);
            x = self.integrator[stage];
        }
        self.pos += 1;
        if self.pos == self.decimation {
            self.pos = 0;
            output(self.comb());
        }
    }

    fn comb(&mut self) -> i64 {
        // Last integrator stage is always the comb input
        let mut x = self.integrator[self.stages - 1];
        for stage in 0..self.stages {
            let y = x.wrapping_sub(self.comb[stage]);
            self.comb[stage] = x;
            x = y;
        }
        x
    }
}
