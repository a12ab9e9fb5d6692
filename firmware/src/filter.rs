use crate::mutex::{MainCtx, MutexCell};

/// First order low pass on raw ADC values.
pub struct Filter {
    buf: MutexCell<u32>,
    out: MutexCell<u16>,
}

impl Filter {
    pub const fn new() -> Self {
        Self {
            buf: MutexCell::new(0),
            out: MutexCell::new(0),
        }
    }

    #[inline(never)]
    pub fn run(&self, m: &MainCtx<'_>, input: u16, div: u16) -> u16 {
        let mut buf = self.buf.get(m);
        buf -= u32::from(self.out.get(m));
        buf += u32::from(input);
        self.buf.set(m, buf);

        let out = (buf / u32::from(div.max(1))) as u16;
        self.out.set(m, out);

        out
    }
}

// vim: ts=4 sw=4 expandtab
