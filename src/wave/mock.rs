// 仅在测试时编译：记录所有HAL调用，并共享一条模拟时间线

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Mutex, Once};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::{Error, ErrorKind, ErrorType, SetDutyCycle};
use embedded_timers::clock::Clock;

use super::DetailSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Duty(u16),
    Sleep(u32),
    Line(String),
}

#[derive(Debug, Default)]
pub struct Timeline {
    pub events: Vec<Event>,
    pub now_ns: u64,
    /// 第N次（从1开始）写针脚时失败一次
    pub fail_at_write: Option<usize>,
    writes: usize,
}

impl Timeline {
    pub fn duties(&self) -> Vec<u16> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Duty(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Sleep(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Line(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.now_ns / 1_000_000
    }
}

pub type Shared = Rc<RefCell<Timeline>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFailed {
    pub duty: u16,
}

impl Error for WriteFailed {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct MockPin(pub Shared);

impl ErrorType for MockPin {
    type Error = WriteFailed;
}

impl SetDutyCycle for MockPin {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let mut timeline = self.0.borrow_mut();
        timeline.writes += 1;
        if timeline.fail_at_write == Some(timeline.writes) {
            timeline.fail_at_write = None;
            return Err(WriteFailed { duty });
        }
        timeline.events.push(Event::Duty(duty));
        Ok(())
    }
}

pub struct MockDelay(pub Shared);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut timeline = self.0.borrow_mut();
        timeline.events.push(Event::Sleep(ms));
        timeline.now_ns += u64::from(ms) * 1_000_000;
    }
}

/// 只随MockDelay前进的时钟
pub struct MockClock {
    shared: Shared,
    epoch: Instant,
}

impl Clock for MockClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        self.epoch + Duration::from_nanos(self.shared.borrow().now_ns)
    }

    fn elapsed(&self, instant: Self::Instant) -> Duration {
        self.now() - instant
    }
}

pub struct MockSink(pub Shared);

impl DetailSink for MockSink {
    fn line(&mut self, line: &str) {
        self.0.borrow_mut().events.push(Event::Line(line.to_string()));
    }
}

pub fn rig() -> (Shared, MockPin, MockDelay, MockClock, MockSink) {
    let shared = Shared::default();
    (
        shared.clone(),
        MockPin(shared.clone()),
        MockDelay(shared.clone()),
        MockClock {
            shared: shared.clone(),
            epoch: Instant::now(),
        },
        MockSink(shared),
    )
}

/// 捕获`log`记录的全局日志器，按线程区分以免并行测试互相干扰
struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, String)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((
                thread::current().id(),
                format!("{} {}", record.level(), record.args()),
            ));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};
static INSTALL: Once = Once::new();

/// 安装捕获日志器（只会安装一次）
pub fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
    take_logs();
}

/// 取出当前线程捕获到的日志
pub fn take_logs() -> Vec<String> {
    let me = thread::current().id();
    let mut records = CAPTURE.records.lock().unwrap();
    let (mine, others): (Vec<_>, Vec<_>) = records.drain(..).partition(|(id, _)| *id == me);
    *records = others;
    mine.into_iter().map(|(_, line)| line).collect()
}
