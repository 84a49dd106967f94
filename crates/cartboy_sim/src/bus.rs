use bitflags::bitflags;
use cartboy_common::{BusTiming, CartBus, Direction, Level, Signal};

use crate::gb::SimGbCart;
use crate::gba::SimGbaCart;

bitflags! {
    /// Control strobes currently pulled low.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct Strobes: u8 {
        const RD = 0b0001;
        const WR = 0b0010;
        const CS1 = 0b0100;
        const CS2 = 0b1000;
    }
}

impl Strobes {
    fn for_signal(signal: Signal) -> Option<Strobes> {
        match signal {
            Signal::Rd => Some(Strobes::RD),
            Signal::Wr => Some(Strobes::WR),
            Signal::Cs1 => Some(Strobes::CS1),
            Signal::Cs2 => Some(Strobes::CS2),
            Signal::ModeSense => None,
        }
    }
}

/// What is plugged into the slot.
pub enum Slot {
    Empty,
    Gb(SimGbCart),
    Gba(SimGbaCart),
}

/// Pin-level model of the dumper's cartridge slot.
pub struct SimBus {
    slot: Slot,
    low: Strobes,
    address: u16,
    address_dir: Direction,
    data: u8,
    data_dir: Direction,
    timing: BusTiming,
    waited_ns: u64,
}

impl SimBus {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            low: Strobes::empty(),
            address: 0,
            address_dir: Direction::Input,
            data: 0,
            data_dir: Direction::Input,
            timing: BusTiming::NONE,
            waited_ns: 0,
        }
    }

    pub fn empty() -> Self {
        Self::new(Slot::Empty)
    }

    pub fn with_gb(cart: SimGbCart) -> Self {
        Self::new(Slot::Gb(cart))
    }

    pub fn with_gba(cart: SimGbaCart) -> Self {
        Self::new(Slot::Gba(cart))
    }

    pub fn set_timing(&mut self, timing: BusTiming) {
        self.timing = timing;
    }

    /// Swap the cartridge. Pin state is left as the dumper drives it.
    pub fn insert(&mut self, slot: Slot) -> Slot {
        std::mem::replace(&mut self.slot, slot)
    }

    pub fn eject(&mut self) -> Slot {
        self.insert(Slot::Empty)
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn gb_cart(&self) -> Option<&SimGbCart> {
        match &self.slot {
            Slot::Gb(cart) => Some(cart),
            _ => None,
        }
    }

    pub fn gb_cart_mut(&mut self) -> Option<&mut SimGbCart> {
        match &mut self.slot {
            Slot::Gb(cart) => Some(cart),
            _ => None,
        }
    }

    pub fn gba_cart(&self) -> Option<&SimGbaCart> {
        match &self.slot {
            Slot::Gba(cart) => Some(cart),
            _ => None,
        }
    }

    pub fn gba_cart_mut(&mut self) -> Option<&mut SimGbaCart> {
        match &mut self.slot {
            Slot::Gba(cart) => Some(cart),
            _ => None,
        }
    }

    /// Strobes currently held low.
    pub fn strobes(&self) -> Strobes {
        self.low
    }

    /// Total time the drivers asked the bus to wait.
    pub fn waited_ns(&self) -> u64 {
        self.waited_ns
    }

    fn falling_edge(&mut self, strobe: Strobes) {
        if let Slot::Gba(cart) = &mut self.slot {
            if strobe == Strobes::CS1 && self.address_dir == Direction::Output {
                cart.latch(((self.data as u32) << 16) | self.address as u32);
            }
        }
    }

    fn rising_edge(&mut self, strobe: Strobes) {
        let low = self.low;
        let data_out = self.data_dir == Direction::Output;
        match &mut self.slot {
            Slot::Empty => {}
            Slot::Gb(cart) => {
                if strobe == Strobes::WR && data_out {
                    if low.contains(Strobes::CS1) && (0xA000..=0xBFFF).contains(&self.address) {
                        cart.ram_write(self.address, self.data);
                    } else if self.address < 0x8000 {
                        cart.rom_write(self.address, self.data);
                    }
                } else if strobe == Strobes::CS2 {
                    // CS2 doubles as the reset line of the 8-bit slot.
                    cart.reset();
                }
            }
            Slot::Gba(cart) => {
                if strobe == Strobes::RD && low.contains(Strobes::CS1) {
                    cart.rd_clock();
                } else if strobe == Strobes::WR && low.contains(Strobes::CS1) {
                    cart.wr_clock(self.address & 0x0001 != 0);
                } else if strobe == Strobes::WR && low.contains(Strobes::CS2) && data_out {
                    cart.save_write(self.address, self.data);
                } else if strobe == Strobes::CS1 {
                    cart.release();
                }
            }
        }
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::empty()
    }
}

impl CartBus for SimBus {
    fn set_signal(&mut self, signal: Signal, level: Level) {
        let Some(strobe) = Strobes::for_signal(signal) else {
            // The mode-sense line is an input.
            return;
        };
        let was_low = self.low.contains(strobe);
        self.low.set(strobe, level.is_low());
        match (was_low, level) {
            (false, Level::Low) => self.falling_edge(strobe),
            (true, Level::High) => self.rising_edge(strobe),
            _ => {}
        }
    }

    fn read_signal(&mut self, signal: Signal) -> Level {
        match Strobes::for_signal(signal) {
            Some(strobe) if self.low.contains(strobe) => Level::Low,
            Some(_) => Level::High,
            None => match self.slot {
                Slot::Gba(_) => Level::Low,
                _ => Level::High,
            },
        }
    }

    fn drive_address(&mut self, value: u16) {
        self.address = value;
    }

    fn set_address_direction(&mut self, direction: Direction) {
        self.address_dir = direction;
    }

    fn read_address(&mut self) -> u16 {
        if self.address_dir == Direction::Output {
            return self.address;
        }
        match &self.slot {
            Slot::Gba(cart) => cart.ad_lines(self.low),
            _ => 0xFFFF,
        }
    }

    fn set_data_direction(&mut self, direction: Direction) {
        self.data_dir = direction;
    }

    fn write_data(&mut self, value: u8) {
        self.data = value;
    }

    fn read_data(&mut self) -> u8 {
        if self.data_dir == Direction::Output {
            return self.data;
        }
        if !self.low.contains(Strobes::RD) {
            return 0xFF;
        }
        match &self.slot {
            Slot::Empty => 0xFF,
            Slot::Gb(cart) => {
                if self.low.contains(Strobes::CS1) && (0xA000..=0xBFFF).contains(&self.address) {
                    cart.ram_read(self.address)
                } else if self.address < 0x8000 {
                    cart.rom_read(self.address)
                } else {
                    0xFF
                }
            }
            Slot::Gba(cart) if self.low.contains(Strobes::CS2) => cart.save_read(self.address),
            Slot::Gba(_) => 0xFF,
        }
    }

    fn timing(&self) -> BusTiming {
        self.timing
    }

    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns += ns as u64;
    }
}
