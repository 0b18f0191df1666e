//! End-to-end enumeration tests against a simulated bus.
//!
//! The simulation implements both transport halves over shared state: every
//! transmitted frame is reflected back as an echo event (as a real bus
//! interface does), and the simulated units answer compare, verify and the
//! programming commands according to their random addresses.

use dali_bus::connection::{open, BusState};
use dali_bus::device::commissioning::DeviceCommissioner;
use dali_bus::gear::commissioning::GearCommissioner;
use dali_bus::transport::hid::{HidPortOut, HidSender, REPORT_SIZE};
use dali_bus::transport::{EventSource, FrameSink};
use dali_bus::{BusFault, DaliError, FrameLength, Result, RxEvent, TxFrame};
use embassy_futures::join::join;
use embassy_time::{Duration, Instant, Timer};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Reply timeout for the simulation; generous against scheduling jitter
/// while keeping no-reply compares quick.
const SIM_TIMEOUT: Duration = Duration::from_millis(50);

/// Granularity at which a poll re-checks the simulated event queue.
const POLL_SLICE: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct SimUnit {
    random_address: u32,
    short_address: Option<u8>,
    initialised: bool,
    withdrawn: bool,
}

impl SimUnit {
    fn new(random_address: u32) -> Self {
        Self {
            random_address,
            short_address: None,
            initialised: false,
            withdrawn: false,
        }
    }

    fn in_search(&self) -> bool {
        self.initialised && !self.withdrawn
    }
}

#[derive(Debug, Default)]
struct SimState {
    units: Vec<SimUnit>,
    search_address: u32,
    dtr0: u8,
    quiescent: bool,
    events: VecDeque<RxEvent>,
}

impl SimState {
    /// Single YES replies arrive as a backward frame; simultaneous replies
    /// collide into a framing fault, which still counts as an answer.
    fn reply_yes(&mut self, responders: usize) {
        match responders {
            0 => {}
            1 => self.events.push_back(RxEvent::Frame {
                length: FrameLength::Backward,
                data: 0xFF,
            }),
            _ => self.events.push_back(RxEvent::Fault(BusFault::Framing)),
        }
    }

    fn set_search_byte(&mut self, shift: u32, value: u8) {
        self.search_address =
            (self.search_address & !(0xFF << shift)) | (u32::from(value) << shift);
    }

    fn compare(&mut self) {
        let search = self.search_address;
        let responders = self
            .units
            .iter()
            .filter(|u| u.in_search() && u.random_address <= search)
            .count();
        self.reply_yes(responders);
    }

    fn withdraw(&mut self) {
        let search = self.search_address;
        for unit in &mut self.units {
            if unit.in_search() && unit.random_address == search {
                unit.withdrawn = true;
            }
        }
    }

    fn program(&mut self, short_address: u8) {
        let search = self.search_address;
        for unit in &mut self.units {
            if unit.in_search() && unit.random_address == search {
                unit.short_address = Some(short_address);
            }
        }
    }

    fn verify(&mut self, short_address: u8) {
        let responders = self
            .units
            .iter()
            .filter(|u| u.initialised && u.short_address == Some(short_address))
            .count();
        self.reply_yes(responders);
    }

    fn terminate(&mut self) {
        for unit in &mut self.units {
            unit.initialised = false;
            unit.withdrawn = false;
        }
    }

    fn initialise(&mut self) {
        for unit in &mut self.units {
            unit.initialised = true;
            unit.withdrawn = false;
        }
    }

    fn set_short_from_dtr0(&mut self) {
        let short_address = match self.dtr0 {
            0xFF => None,
            value => Some(value),
        };
        for unit in &mut self.units {
            unit.short_address = short_address;
        }
    }

    /// 16-bit control-gear frame.
    fn receive_gear(&mut self, data: u32) {
        let address = (data >> 8) as u8;
        let value = data as u8;
        match address {
            0xA1 => self.terminate(),
            0xA3 => self.dtr0 = value,
            0xA5 => self.initialise(),
            // Random addresses are fixed per unit for determinism
            0xA7 => {}
            0xA9 => self.compare(),
            0xAB => self.withdraw(),
            0xB1 => self.set_search_byte(16, value),
            0xB3 => self.set_search_byte(8, value),
            0xB5 => self.set_search_byte(0, value),
            0xB7 => self.program(value >> 1),
            0xB9 => self.verify(value >> 1),
            // Broadcast commands; gear DTR0 carries (n << 1) | 1 or the mask
            0xFF if value == 0x80 => {
                let short_address = match self.dtr0 {
                    0xFF => None,
                    wire => Some(wire >> 1),
                };
                for unit in &mut self.units {
                    unit.short_address = short_address;
                }
            }
            _ => {}
        }
    }

    /// 24-bit control-device frame.
    fn receive_device(&mut self, data: u32) {
        let address = (data >> 16) as u8;
        let instance = (data >> 8) as u8;
        let opcode = data as u8;
        match address {
            // Special frames: the middle byte selects the command
            0xC1 => match instance {
                0x00 => self.terminate(),
                0x01 if opcode == 0xFF => self.initialise(),
                0x02 => {}
                0x03 => self.compare(),
                0x04 => self.withdraw(),
                0x05 => self.set_search_byte(16, opcode),
                0x06 => self.set_search_byte(8, opcode),
                0x07 => self.set_search_byte(0, opcode),
                0x08 => self.program(opcode),
                0x09 => self.verify(opcode),
                0x30 => self.dtr0 = opcode,
                _ => {}
            },
            // Combined DTR writes carry no addressable state here
            0xC7 | 0xC9 => {}
            // Broadcast configure commands at the device instance
            0xFF if instance == 0xFE => match opcode {
                0x14 => self.set_short_from_dtr0(),
                0x1D => self.quiescent = true,
                0x1E => self.quiescent = false,
                _ => {}
            },
            _ => {}
        }
    }
}

/// Both transport halves of the simulated bus; clone one per half.
#[derive(Clone)]
struct SimBus {
    state: Arc<Mutex<SimState>>,
}

impl SimBus {
    fn with_units(random_addresses: &[u32]) -> Self {
        let units = random_addresses.iter().copied().map(SimUnit::new).collect();
        Self {
            state: Arc::new(Mutex::new(SimState {
                units,
                ..SimState::default()
            })),
        }
    }

    fn short_addresses(&self) -> Vec<Option<u8>> {
        let state = self.state.lock().unwrap();
        state.units.iter().map(|u| u.short_address).collect()
    }

    fn all_terminated(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.units.iter().all(|u| !u.initialised)
    }

    fn is_quiescent(&self) -> bool {
        self.state.lock().unwrap().quiescent
    }
}

impl FrameSink for SimBus {
    async fn send(&mut self, frame: &TxFrame) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        // The interface reflects our own forward frame first
        state.events.push_back(RxEvent::Frame {
            length: frame.length(),
            data: frame.data(),
        });
        match frame.length() {
            FrameLength::Gear => state.receive_gear(frame.data()),
            FrameLength::Device => state.receive_device(frame.data()),
            FrameLength::Backward => {}
        }
        Ok(())
    }
}

impl EventSource for SimBus {
    /// Sleeps in short slices so a reply pushed mid-poll is observed well
    /// within the reply timeout instead of after the full poll interval.
    async fn poll(&mut self, timeout: Duration) -> Result<Option<RxEvent>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = self.state.lock().unwrap().events.pop_front() {
                return Ok(Some(event));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            Timer::after(POLL_SLICE).await;
        }
    }
}

async fn run_gear_enumeration(bus: &SimBus, state: &'static BusState) -> Result<Vec<u8>> {
    let (mut conn, mut reader) = open(bus.clone(), bus.clone(), state).await?;
    let client = async {
        let result = GearCommissioner::new(&mut conn)
            .with_timeout(SIM_TIMEOUT)
            .enumerate()
            .await;
        conn.close();
        result
    };
    let (result, _) = join(client, reader.run()).await;
    result.map(|assigned| assigned.to_vec())
}

#[tokio::test]
async fn test_empty_bus_yields_no_addresses() {
    static BUS: BusState = BusState::new();
    let bus = SimBus::with_units(&[]);
    let assigned = run_gear_enumeration(&bus, &BUS).await.unwrap();
    assert!(assigned.is_empty());
}

#[tokio::test]
async fn test_single_gear_converges() {
    static BUS: BusState = BusState::new();
    let bus = SimBus::with_units(&[0x12_3456]);
    let assigned = run_gear_enumeration(&bus, &BUS).await.unwrap();
    assert_eq!(assigned, [0]);
    assert_eq!(bus.short_addresses(), [Some(0)]);
    assert!(bus.all_terminated());
}

#[tokio::test]
async fn test_gear_assigned_in_random_address_order() {
    static BUS: BusState = BusState::new();
    // Lowest random address is isolated first
    let bus = SimBus::with_units(&[0x77_7777, 0x11_1111, 0x22_2222]);
    let assigned = run_gear_enumeration(&bus, &BUS).await.unwrap();
    assert_eq!(assigned, [0, 1, 2]);
    assert_eq!(bus.short_addresses(), [Some(2), Some(0), Some(1)]);
    assert!(bus.all_terminated());
}

#[tokio::test]
async fn test_enumeration_replaces_existing_short_addresses() {
    static BUS: BusState = BusState::new();
    let bus = SimBus::with_units(&[0xFF_FFFE, 0x00_0001]);
    {
        let mut state = bus.state.lock().unwrap();
        state.units[0].short_address = Some(42);
        state.units[1].short_address = Some(42);
    }
    let assigned = run_gear_enumeration(&bus, &BUS).await.unwrap();
    assert_eq!(assigned, [0, 1]);
    assert_eq!(bus.short_addresses(), [Some(1), Some(0)]);
}

/// A port implementation outside the crate must be able to build the
/// transport errors its pump methods return.
struct BrokenPort;

impl HidPortOut for BrokenPort {
    async fn write_report(&mut self, _report: &[u8; REPORT_SIZE]) -> Result<()> {
        Err(DaliError::send_failed())
    }
}

#[tokio::test]
async fn test_port_failure_surfaces_as_transport_error() {
    let mut sender = HidSender::new(BrokenPort);
    let err = sender.send(&TxFrame::gear(0xFF, 0x00)).await.unwrap_err();
    assert!(matches!(err, DaliError::Transport(e) if e.is_send_failed()));
}

#[tokio::test]
async fn test_single_device_converges() {
    static BUS: BusState = BusState::new();
    let bus = SimBus::with_units(&[0x65_4321]);
    let (mut conn, mut reader) = open(bus.clone(), bus.clone(), &BUS).await.unwrap();
    let client = async {
        let result = DeviceCommissioner::new(&mut conn)
            .with_timeout(SIM_TIMEOUT)
            .enumerate()
            .await;
        conn.close();
        result
    };
    let (result, _) = join(client, reader.run()).await;
    let assigned = result.unwrap();
    assert_eq!(assigned.as_slice(), [0]);
    assert_eq!(bus.short_addresses(), [Some(0)]);
    assert!(bus.all_terminated());
    // Quiescent mode was started for the run and stopped afterwards
    assert!(!bus.is_quiescent());
}
