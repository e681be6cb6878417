//! Linux SPI device implementation
//!
//! This module provides the `LinuxSpi` struct that implements the
//! `SpiTransfer` trait using Linux's spidev interface.

use crate::error::{LinuxSpiError, Result};

use habspi_core::error::{Error as CoreError, Result as CoreResult};
use habspi_core::spi::{check_lengths, BitOrder, CsPolarity, SpiMode, SpiSettings, SpiTransfer};

use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default transfer timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// spidev mode flags
pub mod mode {
    /// Chip select is active high
    pub const SPI_CS_HIGH: u8 = 0x04;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_LSB_FIRST: u8 = 2;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_lsb_first,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_LSB_FIRST,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    // SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])

    /// Size of spi_ioc_transfer struct
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// Session settings applied at open time
    pub settings: SpiSettings,
    /// Upper bound for one transfer, `None` blocks indefinitely
    pub timeout: Option<Duration>,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        let settings = SpiSettings::RADIO;
        Self {
            device: default_device(&settings),
            settings,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.settings = self.settings.with_speed_hz(speed_hz);
        self
    }

    /// Replace the session settings
    pub fn with_settings(mut self, settings: SpiSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the transfer timeout (`None` disables it)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// spidev node for bus 0 and the native chip select of `settings`
fn default_device(settings: &SpiSettings) -> String {
    format!("/dev/spidev0.{}", settings.chip_select.index())
}

/// Mode byte for SPI_IOC_WR_MODE
fn mode_byte(settings: &SpiSettings) -> u8 {
    let mut mode = settings.mode.bits();
    if settings.cs_polarity == CsPolarity::ActiveHigh {
        mode |= mode::SPI_CS_HIGH;
    }
    mode
}

type WorkerResult = Result<Vec<u8>>;

/// Worker left behind by a timed-out transfer
///
/// Its ioctl may still be clocking the bus, so no new transfer may start
/// until it reports back.
#[derive(Default)]
struct StrandedWorker(Option<Receiver<WorkerResult>>);

impl StrandedWorker {
    fn is_pending(&self) -> bool {
        self.0.is_some()
    }

    /// Fail with [`LinuxSpiError::Stranded`] while the worker is still running
    fn check(&mut self) -> Result<()> {
        let Some(receiver) = &self.0 else {
            return Ok(());
        };
        match receiver.try_recv() {
            Err(TryRecvError::Empty) => Err(LinuxSpiError::Stranded),
            Ok(_) | Err(TryRecvError::Disconnected) => {
                log::info!("linux_spi: Timed-out transfer has completed, bus usable again");
                self.0 = None;
                Ok(())
            }
        }
    }

    /// Wait for a worker, keeping its receiver if it times out
    fn wait(&mut self, receiver: Receiver<WorkerResult>, timeout: Duration) -> WorkerResult {
        match receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::error!("linux_spi: Transfer timed out after {:?}", timeout);
                self.0 = Some(receiver);
                Err(LinuxSpiError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(LinuxSpiError::TransferFailed(
                std::io::Error::other("transfer worker exited without a result"),
            )),
        }
    }
}

/// Linux SPI bus using the spidev interface
pub struct LinuxSpi {
    /// File handle for spidev device
    file: File,
    /// Maximum kernel buffer size
    max_kernel_buf_size: usize,
    /// Current speed in Hz
    speed_hz: u32,
    timeout: Option<Duration>,
    stranded: StrandedWorker,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::InvalidParameter(
                "No device specified. Use spidev=/dev/spidevX.Y".into(),
            ));
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();
        let settings = &config.settings;

        let mode = mode_byte(settings);
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxSpiError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let lsb_first = settings.bit_order == BitOrder::LsbFirst;
        let lsb: u8 = lsb_first.into();
        unsafe {
            ioctl::spi_ioc_wr_lsb_first(fd, &lsb).map_err(|e| {
                LinuxSpiError::SetBitOrderFailed {
                    lsb_first,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        // Set bits per word (always 8)
        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = settings.speed_hz();
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} Hz, divider={})",
            config.device,
            settings.mode.bits(),
            speed,
            settings.clock_divider
        );

        let max_kernel_buf_size = get_max_kernel_buf_size();
        log::debug!(
            "linux_spi: Max kernel buffer size: {} bytes",
            max_kernel_buf_size
        );

        Ok(Self {
            file,
            max_kernel_buf_size,
            speed_hz: speed,
            timeout: config.timeout,
            stranded: StrandedWorker::default(),
        })
    }

    /// Open a device with the radio settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    /// Get current speed setting
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Get the transfer timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether a timed-out transfer may still be running
    pub fn is_stranded(&self) -> bool {
        self.stranded.is_pending()
    }

    /// Run one full-duplex transfer, bounded by the configured timeout
    fn spi_transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<()> {
        self.stranded.check()?;
        if write.len() > self.max_kernel_buf_size {
            return Err(LinuxSpiError::InvalidParameter(format!(
                "transfer of {} bytes exceeds kernel buffer of {} bytes",
                write.len(),
                self.max_kernel_buf_size
            )));
        }

        match self.timeout {
            None => transfer_blocking(self.file.as_raw_fd(), self.speed_hz, write, read),
            Some(timeout) => self.transfer_with_timeout(write, read, timeout),
        }
    }

    /// The ioctl runs on a worker owning a duplicate of the fd and copies of
    /// the buffers, so a wedged controller only strands the worker.
    fn transfer_with_timeout(
        &mut self,
        write: &[u8],
        read: &mut [u8],
        timeout: Duration,
    ) -> Result<()> {
        let file = self.file.try_clone().map_err(LinuxSpiError::WorkerFailed)?;
        let tx = write.to_vec();
        let len = read.len();
        let speed_hz = self.speed_hz;
        let (sender, receiver) = mpsc::channel();

        thread::Builder::new()
            .name("habspi-spi".into())
            .spawn(move || {
                let mut rx = vec![0u8; len];
                let result = transfer_blocking(file.as_raw_fd(), speed_hz, &tx, &mut rx);
                // The receiver is gone if the caller already timed out
                let _ = sender.send(result.map(|()| rx));
            })
            .map_err(LinuxSpiError::WorkerFailed)?;

        let rx = self.stranded.wait(receiver, timeout)?;
        read.copy_from_slice(&rx);
        Ok(())
    }
}

/// Issue a single SPI_IOC_MESSAGE(1) with both tx and rx set
fn transfer_blocking(fd: RawFd, speed_hz: u32, write: &[u8], read: &mut [u8]) -> Result<()> {
    let transfer = SpiIocTransfer {
        tx_buf: write.as_ptr() as u64,
        rx_buf: read.as_mut_ptr() as u64,
        len: write.len() as u32,
        speed_hz,
        bits_per_word: 8,
        ..Default::default()
    };

    let ioctl_num = ioctl::spi_ioc_message(1);
    let ret = unsafe { libc::ioctl(fd, ioctl_num, &transfer as *const SpiIocTransfer) };

    if ret < 0 {
        return Err(LinuxSpiError::TransferFailed(
            std::io::Error::last_os_error(),
        ));
    }

    Ok(())
}

impl SpiTransfer for LinuxSpi {
    fn transfer(&mut self, write: &[u8], read: &mut [u8]) -> CoreResult<()> {
        check_lengths(write, read)?;
        if write.is_empty() {
            return Ok(());
        }
        self.spi_transfer(write, read).map_err(|e| {
            log::error!("linux_spi: {}", e);
            CoreError::from(e)
        })
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                log::debug!("linux_spi: Using buffer size {} from sysfs", size);
                return size;
            }
        }
        log::warn!("linux_spi: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    log::debug!("linux_spi: Using page size {} as buffer size", page_size);
    page_size
}

/// Option keys understood by [`parse_options`]
pub const OPTION_KEYS: &[&str] = &["spidev", "spispeed", "mode", "timeout"];

/// Parse programmer options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "spidev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                if speed_khz == 0 {
                    return Err("spispeed must be non-zero".to_string());
                }
                config = config.with_speed(speed_khz.saturating_mul(1000));
            }
            "mode" => {
                let bits: u8 = value
                    .parse()
                    .map_err(|_| format!("Invalid mode value: {}", value))?;
                config.settings.mode = SpiMode::from_bits(bits)
                    .ok_or_else(|| format!("Invalid SPI mode: {} (must be 0-3)", bits))?;
            }
            "timeout" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid timeout value: {}", value))?;
                config.timeout = (ms != 0).then(|| Duration::from_millis(ms));
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err("No device specified. Use spidev=/dev/spidevX.Y".to_string());
    }

    Ok(config)
}
