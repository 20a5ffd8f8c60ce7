use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;
use embedded_timers::clock::Clock;

#[cfg(test)]
mod mock;
mod settings;
mod sink;

pub use settings::WaveSettings;
pub use sink::{DetailSink, LogSink};

use settings::{clamp_amplitude, clamp_millis};

/// 最大输出幅值（8位软件PWM）
pub const MAX_AMPLITUDE: u8 = 255;

/// 发射策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirePolicy {
    /// 每次调用都完整发射
    Repeating,
    /// 只在第一次调用时发射，之后永久失效
    SingleShot,
}

impl FirePolicy {
    fn tag(self) -> &'static str {
        match self {
            FirePolicy::Repeating => "RepeatingWave",
            FirePolicy::SingleShot => "SingleShotWave",
        }
    }
}

/// 发射器状态，Fired为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveState {
    Armed,
    Fired,
}

/// 软件方波发射器
///
/// 通过阻塞延时在一个PWM针脚上交替输出幅值和0，近似一个方波。
/// 一个周期 = 输出幅值并保持`on_time`毫秒，再输出0并保持`off_time`毫秒。
///
/// - 针脚由发射器独占，不支持多线程并发访问
/// - SingleShot策略下第一次成功发射之后，所有发射调用都不再产生任何输出
pub struct WaveEmitter<P, D, C, S = LogSink> {
    /// 输出针脚
    pin: P,
    /// 阻塞延时
    delay: D,
    /// 单调时钟，仅emit_for_duration使用
    clock: C,
    /// 诊断输出
    sink: S,
    policy: FirePolicy,
    state: WaveState,
    name: Option<String>,
    amplitude: u8,
    on_time: u32,
    off_time: u32,
    logging: bool,
}

impl<P, D, C> WaveEmitter<P, D, C, LogSink>
where
    P: SetDutyCycle,
    D: DelayNs,
    C: Clock,
    C::Instant: Clone,
{
    /// 创建可重复发射的实例，诊断信息写入日志
    pub fn repeating(pin: P, delay: D, clock: C, logging: bool) -> Self {
        Self::new(FirePolicy::Repeating, pin, delay, clock, LogSink, logging)
    }

    /// 创建只发射一次的实例，诊断信息写入日志
    pub fn single_shot(pin: P, delay: D, clock: C, logging: bool) -> Self {
        Self::new(FirePolicy::SingleShot, pin, delay, clock, LogSink, logging)
    }
}

impl<P, D, C, S> WaveEmitter<P, D, C, S>
where
    P: SetDutyCycle,
    D: DelayNs,
    C: Clock,
    C::Instant: Clone,
    S: DetailSink,
{
    /// 创建发射器实例
    ///
    /// - 针脚应当已处于输出模式（由针脚的构造函数负责）
    /// - 幅值和高低电平时长均初始化为0
    pub fn new(policy: FirePolicy, pin: P, delay: D, clock: C, sink: S, logging: bool) -> Self {
        Self {
            pin,
            delay,
            clock,
            sink,
            policy,
            state: WaveState::Armed,
            name: None,
            amplitude: 0,
            on_time: 0,
            off_time: 0,
            logging,
        }
    }

    /// 设置波形名称
    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    /// 设置幅值，超出0~255的值会被截断
    pub fn set_amplitude(&mut self, amp: i32) {
        self.amplitude = clamp_amplitude(amp);
    }

    /// 设置高低电平持续时间（毫秒）
    ///
    /// - 负值按0处理，即该相位瞬间跳过
    pub fn set_timing(&mut self, on_time: i64, off_time: i64) {
        self.on_time = clamp_millis(on_time);
        self.off_time = clamp_millis(off_time);
    }

    /// 一次性应用一组参数
    pub fn apply(&mut self, settings: &WaveSettings) {
        match &settings.name {
            Some(name) => self.set_name(name),
            None => self.name = None,
        }
        self.set_amplitude(settings.amplitude);
        self.set_timing(settings.on_time, settings.off_time);
    }

    /// 格式化当前参数
    pub fn details(&self) -> String {
        format!(
            "[{}] ({}) Amplitude: {}, On Time: {} ms, Off Time: {} ms",
            self.policy.tag(),
            self.name.as_deref().unwrap_or("unnamed"),
            self.amplitude,
            self.on_time,
            self.off_time
        )
    }

    /// 把当前参数写入诊断输出，不影响发射状态
    pub fn log_details(&mut self) {
        let line = self.details();
        self.sink.line(&line);
    }

    /// 发射`repetitions`个完整周期
    ///
    /// - 启用日志时先输出一次参数，除此之外不产生任何日志
    /// - 写针脚失败时立即返回错误，不会锁存
    /// - SingleShot策略下全部周期结束后锁存，`repetitions`为0也会锁存
    pub fn emit(&mut self, repetitions: u32) -> Result<(), P::Error> {
        if self.state == WaveState::Fired {
            return Ok(());
        }

        if self.logging {
            self.log_details();
        }

        for _ in 0..repetitions {
            self.cycle()?;
        }

        self.latch();
        Ok(())
    }

    /// 发射一个周期
    pub fn emit_once(&mut self) -> Result<(), P::Error> {
        self.emit(1)
    }

    /// 持续发射直到经过`duration_ms`毫秒
    ///
    /// 只在周期之间检查时间，所以实际耗时最多超出一个周期。结束后强制输出0。
    ///
    /// - Repeating: 每个周期都走一遍`emit`，启用日志时每个周期都会输出参数
    /// - SingleShot: 只在开始前输出一次参数，结束后锁存
    pub fn emit_for_duration(&mut self, duration_ms: u64) -> Result<(), P::Error> {
        if self.state == WaveState::Fired {
            return Ok(());
        }

        let budget = Duration::from_millis(duration_ms);
        let start = self.clock.now();

        match self.policy {
            FirePolicy::Repeating => {
                while self.clock.elapsed(start.clone()) < budget {
                    self.emit(1)?;
                }
            }
            FirePolicy::SingleShot => {
                if self.logging {
                    self.log_details();
                }
                while self.clock.elapsed(start.clone()) < budget {
                    self.cycle()?;
                }
            }
        }

        // 保证信号不会停在高电平
        self.pin.set_duty_cycle_fully_off()?;
        self.latch();
        Ok(())
    }

    /// 单个周期：高电平保持on_time，低电平保持off_time
    fn cycle(&mut self) -> Result<(), P::Error> {
        self.pin
            .set_duty_cycle_fraction(u16::from(self.amplitude), u16::from(MAX_AMPLITUDE))?;
        self.delay.delay_ms(self.on_time);
        self.pin.set_duty_cycle_fully_off()?;
        self.delay.delay_ms(self.off_time);
        Ok(())
    }

    fn latch(&mut self) {
        if self.policy == FirePolicy::SingleShot {
            self.state = WaveState::Fired;
        }
    }
}

impl<P, D, C, S> WaveEmitter<P, D, C, S> {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn amplitude(&self) -> u8 {
        self.amplitude
    }

    pub fn on_time(&self) -> u32 {
        self.on_time
    }

    pub fn off_time(&self) -> u32 {
        self.off_time
    }

    pub fn policy(&self) -> FirePolicy {
        self.policy
    }

    pub fn state(&self) -> WaveState {
        self.state
    }

    pub fn has_fired(&self) -> bool {
        self.state == WaveState::Fired
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// 拆解发射器，归还针脚、延时、时钟和诊断输出
    pub fn release(self) -> (P, D, C, S) {
        (self.pin, self.delay, self.clock, self.sink)
    }
}
