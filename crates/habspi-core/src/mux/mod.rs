//! Virtual chip-select multiplexing
//!
//! Two GPIO lines feed the A/B inputs of a 2-to-4 line decoder whose
//! enable is the host's native CS0. This turns one native chip select into
//! four virtual ones (CSA..CSD).

mod device;
mod select;

pub use device::{
    DecoderSelectPins, SelectPattern, VirtualDeviceId, DEFAULT_PIN_A, DEFAULT_PIN_B,
};
pub use select::{ChipSelect, ChipSelectMux, SelectGuard};

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::error::{Error, Result};
    use crate::gpio::{DecoderGpio, Level, Line};
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum GpioOp {
        Output(Line),
        Write(Line, Level),
    }

    #[derive(Default)]
    struct RecordingGpio {
        ops: Vec<GpioOp>,
        fail_line: Option<Line>,
    }

    impl RecordingGpio {
        fn writes(&self) -> Vec<(Line, Level)> {
            self.ops
                .iter()
                .filter_map(|op| match *op {
                    GpioOp::Write(line, level) => Some((line, level)),
                    GpioOp::Output(_) => None,
                })
                .collect()
        }
    }

    impl DecoderGpio for RecordingGpio {
        fn set_output(&mut self, line: Line) -> Result<()> {
            self.ops.push(GpioOp::Output(line));
            Ok(())
        }

        fn write(&mut self, line: Line, level: Level) -> Result<()> {
            if self.fail_line == Some(line) {
                return Err(Error::Gpio { line });
            }
            self.ops.push(GpioOp::Write(line, level));
            Ok(())
        }
    }

    #[test]
    fn test_configure_sets_outputs() {
        let mut mux = ChipSelectMux::new(RecordingGpio::default());
        assert!(!mux.is_configured());
        mux.configure(DecoderSelectPins::new(5, 6)).unwrap();
        assert!(mux.is_configured());
        assert_eq!(mux.pins(), DecoderSelectPins::new(5, 6));
        assert_eq!(
            mux.gpio().ops,
            [GpioOp::Output(5), GpioOp::Output(6)]
        );
    }

    #[test]
    fn test_select_writes_table() {
        let expected = [
            (VirtualDeviceId::A, Level::Low, Level::Low),
            (VirtualDeviceId::B, Level::High, Level::Low),
            (VirtualDeviceId::C, Level::Low, Level::High),
            (VirtualDeviceId::D, Level::High, Level::High),
        ];

        for (id, a, b) in expected {
            let mut mux = ChipSelectMux::new(RecordingGpio::default());
            mux.configure(DecoderSelectPins::new(24, 25)).unwrap();
            mux.set_active_device(id);
            mux.select().unwrap();
            assert_eq!(mux.gpio().writes(), [(24, a), (25, b)], "device {}", id);
        }
    }

    #[test]
    fn test_set_active_device_has_no_side_effect() {
        let mut mux = ChipSelectMux::new(RecordingGpio::default());
        mux.set_active_device(VirtualDeviceId::D);
        assert!(mux.gpio().ops.is_empty());
        assert_eq!(mux.active_device(), VirtualDeviceId::D);
    }

    #[test]
    fn test_deselect_always_low() {
        for id in VirtualDeviceId::ALL {
            let mut mux = ChipSelectMux::new(RecordingGpio::default());
            mux.configure(DecoderSelectPins::new(24, 25)).unwrap();
            mux.set_active_device(id);
            mux.select().unwrap();
            mux.deselect().unwrap();
            let writes = mux.gpio().writes();
            assert_eq!(writes[2..], [(24, Level::Low), (25, Level::Low)]);
        }

        // Without a prior select
        let mut mux = ChipSelectMux::new(RecordingGpio::default());
        mux.deselect().unwrap();
        assert_eq!(mux.gpio().writes(), [(24, Level::Low), (25, Level::Low)]);
    }

    #[test]
    fn test_unconfigured_defaults() {
        let mut mux = ChipSelectMux::new(RecordingGpio::default());
        mux.select().unwrap();
        assert!(mux.is_configured());
        assert_eq!(
            mux.gpio().ops,
            [
                GpioOp::Output(DEFAULT_PIN_A),
                GpioOp::Output(DEFAULT_PIN_B),
                GpioOp::Write(DEFAULT_PIN_A, Level::Low),
                GpioOp::Write(DEFAULT_PIN_B, Level::Low)
            ]
        );
    }

    #[test]
    fn test_deselect_drives_b_when_a_fails() {
        let mut gpio = RecordingGpio::default();
        gpio.fail_line = Some(24);
        let mut mux =
            ChipSelectMux::with_config(gpio, DecoderSelectPins::default(), VirtualDeviceId::D)
                .unwrap();
        assert_eq!(mux.deselect(), Err(Error::Gpio { line: 24 }));
        assert_eq!(mux.gpio().writes(), [(25, Level::Low)]);
    }

    #[test]
    fn test_reconfigure_moves_lines() {
        let mut mux = ChipSelectMux::with_config(
            RecordingGpio::default(),
            DecoderSelectPins::new(1, 2),
            VirtualDeviceId::D,
        )
        .unwrap();
        mux.configure(DecoderSelectPins::new(3, 4)).unwrap();
        mux.select().unwrap();
        assert_eq!(mux.gpio().writes(), [(3, Level::High), (4, Level::High)]);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let mut mux = ChipSelectMux::with_config(
            RecordingGpio::default(),
            DecoderSelectPins::default(),
            VirtualDeviceId::B,
        )
        .unwrap();
        {
            let _guard = SelectGuard::assert(&mut mux).unwrap();
        }
        assert_eq!(
            mux.gpio().writes(),
            [
                (24, Level::High),
                (25, Level::Low),
                (24, Level::Low),
                (25, Level::Low)
            ]
        );
    }

    #[test]
    fn test_guard_finish_releases_once() {
        let mut mux = ChipSelectMux::with_config(
            RecordingGpio::default(),
            DecoderSelectPins::default(),
            VirtualDeviceId::C,
        )
        .unwrap();
        let guard = mux.select_guard().unwrap();
        guard.finish().unwrap();
        assert_eq!(mux.gpio().writes().len(), 4);
    }

    #[test]
    fn test_failed_select_releases_lines() {
        let mut gpio = RecordingGpio::default();
        gpio.fail_line = Some(25);
        let mut mux = ChipSelectMux::new(gpio);
        mux.set_active_device(VirtualDeviceId::B);
        let err = SelectGuard::assert(&mut mux).err();
        assert_eq!(err, Some(Error::Gpio { line: 25 }));
        // A went high, then the release brought it back low
        assert_eq!(mux.gpio().writes(), [(24, Level::High), (24, Level::Low)]);
    }
}
