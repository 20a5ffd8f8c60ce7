use embedded_hal::pwm::{Error, ErrorKind, ErrorType, SetDutyCycle};
use rppal::gpio::{self, Gpio};

/// 软件PWM默认频率
pub const DEFAULT_FREQUENCY_HZ: f64 = 500.0;

/// 软件PWM的占空比分辨率（8位）
const MAX_DUTY: u16 = 255;

/// 软件PWM写入失败
#[derive(Debug)]
pub struct SoftPwmPinError {
    /// BCM针脚编号
    pub bcm_pin: u8,
    /// 写入失败时的占空比
    pub duty: u16,
    pub source: gpio::Error,
}

impl Error for SoftPwmPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl std::fmt::Display for SoftPwmPinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GPIO{} 设置占空比 {}/{} 失败: {}",
            self.bcm_pin, self.duty, MAX_DUTY, self.source
        )
    }
}

impl std::error::Error for SoftPwmPinError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// 占空比对应的针脚输出方式
#[derive(Debug, Clone, Copy, PartialEq)]
enum DutyLevel {
    /// 关闭PWM，输出低电平
    Low,
    /// 关闭PWM，输出高电平
    High,
    /// 软件PWM，参数为0~1之间的占空比
    Pwm(f64),
}

/// 把8位占空比换算为输出方式，超过最大值的按最大值处理
fn duty_level(duty: u16) -> DutyLevel {
    match duty.min(MAX_DUTY) {
        0 => DutyLevel::Low,
        MAX_DUTY => DutyLevel::High,
        duty => DutyLevel::Pwm(f64::from(duty) / f64::from(MAX_DUTY)),
    }
}

/// 软件PWM输出针脚
///
/// - 任意GPIO都可以使用，占空比由rppal的软件PWM线程维持
/// - 占空比为0或满值时关闭软件PWM，直接输出低/高电平
pub struct SoftPwmPin {
    pin: gpio::OutputPin,
    bcm_pin: u8,
    frequency: f64,
}

impl ErrorType for SoftPwmPin {
    type Error = SoftPwmPinError;
}

impl SoftPwmPin {
    /// 创建软件PWM针脚，针脚被设置为输出模式并置为低电平
    pub fn new(bcm_pin: u8, frequency: f64) -> anyhow::Result<Self> {
        // 构建针脚GPIO对象
        let gpio = Gpio::new()?;
        let pin = gpio.get(bcm_pin)?.into_output_low();
        // OK
        Ok(Self {
            pin,
            bcm_pin,
            frequency,
        })
    }

    /// BCM针脚编号
    pub fn bcm_pin(&self) -> u8 {
        self.bcm_pin
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

impl SetDutyCycle for SoftPwmPin {
    fn max_duty_cycle(&self) -> u16 {
        MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let result = match duty_level(duty) {
            DutyLevel::Low => self.pin.clear_pwm().map(|_| self.pin.set_low()),
            DutyLevel::High => self.pin.clear_pwm().map(|_| self.pin.set_high()),
            DutyLevel::Pwm(ratio) => self.pin.set_pwm_frequency(self.frequency, ratio),
        };
        result.map_err(|source| SoftPwmPinError {
            bcm_pin: self.bcm_pin,
            duty,
            source,
        })
    }
}
