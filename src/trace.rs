//! Optional waveform capture. Records the DUT ports once per clock cycle and
//! writes them out as a minimal VCD file for viewing alongside RTL waves.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::decimator::Decimator;

#[derive(Clone, Copy)]
struct Sample {
    cycle: u64,
    reset_n: bool,
    enable: bool,
    pdm_data: u8,
    pdm_valid: bool,
    pdm_ready: bool,
    pcm_data: i64,
    pcm_valid: bool,
    pcm_ready: bool,
    busy: bool,
    overflow: bool,
    underflow: bool,
}

pub struct TraceRecorder {
    samples: Vec<Sample>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self { samples: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Capture the port values as they stand after a posedge.
    pub fn sample(&mut self, dut: &Decimator) {
        self.samples.push(Sample {
            cycle: dut.cycle(),
            reset_n: dut.reset_n,
            enable: dut.enable,
            pdm_data: dut.pdm_data & 1,
            pdm_valid: dut.pdm_valid,
            pdm_ready: dut.pdm_ready,
            pcm_data: dut.pcm_data,
            pcm_valid: dut.pcm_valid,
            pcm_ready: dut.pcm_ready,
            busy: dut.busy,
            overflow: dut.overflow,
            underflow: dut.underflow,
        });
    }

    pub fn write_vcd<P: AsRef<Path>>(
        &self,
        path: P,
        data_width: u32,
        clock_period_ns: u32,
    ) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);

        writeln!(w, "$timescale 1ns $end")?;
        writeln!(w, "$scope module pdm_pcm_decimator $end")?;
        writeln!(w, "$var wire 1 c clock $end")?;
        for (id, name) in [
            ('r', "reset_n"),
            ('e', "enable"),
            ('d', "pdm_data"),
            ('v', "pdm_valid"),
            ('y', "pdm_ready"),
            ('V', "pcm_valid"),
            ('R', "pcm_ready"),
            ('b', "busy"),
            ('o', "overflow"),
            ('u', "underflow"),
        ] {
            writeln!(w, "$var wire 1 {} {} $end", id, name)?;
        }
        writeln!(
            w,
            "$var wire {} P pcm_data [{}:0] $end",
            data_width,
            data_width - 1
        )?;
        writeln!(w, "$upscope $end")?;
        writeln!(w, "$enddefinitions $end")?;

        let period = clock_period_ns as u64;
        let mask = if data_width == 64 {
            u64::MAX
        } else {
            (1u64 << data_width) - 1
        };
        for s in &self.samples {
            let t = s.cycle * period;
            writeln!(w, "#{}", t)?;
            writeln!(w, "1c")?;
            for (id, value) in [
                ('r', s.reset_n),
                ('e', s.enable),
                ('d', s.pdm_data != 0),
                ('v', s.pdm_valid),
                ('y', s.pdm_ready),
                ('V', s.pcm_valid),
                ('R', s.pcm_ready),
                ('b', s.busy),
                ('o', s.overflow),
                ('u', s.underflow),
            ] {
                writeln!(w, "{}{}", u8::from(value), id)?;
            }
            // Two's complement limited to the port width
            writeln!(w, "b{:b} P", s.pcm_data as u64 & mask)?;
            writeln!(w, "#{}", t + period / 2)?;
            writeln!(w, "0c")?;
        }
        w.flush()
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}
