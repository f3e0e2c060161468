
use rand::{RngCore,SeedableRng,Rng,rngs::StdRng};

/// RandMode controls random generator behaviour. May be predictable for testing or truly random for gameplay
pub enum RandMode {
    Predictable,
    RandomUniform,
}

pub struct ZRand {
    rng : Box<dyn RngCore>,
    rand_mode : RandMode,
}

impl ZRand {
    pub fn new(rm: RandMode) -> ZRand {
        ZRand { rng: Box::new(rand::thread_rng()), rand_mode: rm }
    }

    pub fn new_uniform() -> ZRand {
        ZRand::new(RandMode::RandomUniform)
    }


    pub fn new_predictable(seed: u64) -> ZRand {
        ZRand {rng: Box::new(StdRng::seed_from_u64(seed)), rand_mode: RandMode::Predictable}
    }

    /// gen_unsigned_rand generates unsigned in range [0..32767]
    pub fn gen_unsigned_rand(&mut self) -> u16 {
        // NOTE: This could probably be (u16::MAX +1) / 2
        self.rng.gen_range(0..32768)
    }

    /// Reseed per the `random` opcode's convention: a negative argument
    /// reseeds predictably from that value, zero reseeds from system
    /// entropy, and the caller skips calling this entirely for a
    /// positive argument (the normal random-draw case).
    pub fn reseed(&mut self, arg: i16) {
        if arg < 0 {
            *self = ZRand::new_predictable((-arg) as u64);
        } else {
            *self = ZRand::new_uniform();
        }
    }
}
