use embedded_hal::pwm::{Error, ErrorKind, ErrorType, SetDutyCycle};
use embedded_hal_0::PwmPin;

/// 硬件PWM通道写入失败
#[derive(Debug)]
pub struct PwmChannelError {
    /// 写入失败时rppal的占空比比例
    pub ratio: f64,
    pub source: rppal::pwm::Error,
}

impl Error for PwmChannelError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl std::fmt::Display for PwmChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PWM通道设置占空比 {:.4} 失败: {}", self.ratio, self.source)
    }
}

impl std::error::Error for PwmChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// 把16位占空比换算为rppal的比例值（0.0~max_ratio）
fn channel_ratio(duty: u16, max_ratio: f64) -> f64 {
    f64::from(duty) / f64::from(u16::MAX) * max_ratio
}

/// 硬件PWM通道输出针脚
///
/// - 树莓派的PWM0/PWM1通道，占空比由硬件维持
/// - rppal以0.0~get_max_duty()的比例表示占空比，这里对外暴露16位分辨率
pub struct PwmChannelPin {
    pwm: rppal::pwm::Pwm,
}

impl ErrorType for PwmChannelPin {
    type Error = PwmChannelError;
}

impl PwmChannelPin {
    /// 包装一个已创建好的硬件PWM通道，并确保通道已启用
    pub fn new(pwm: rppal::pwm::Pwm) -> anyhow::Result<Self> {
        pwm.enable()?;
        Ok(Self { pwm })
    }
}

impl SetDutyCycle for PwmChannelPin {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let ratio = channel_ratio(duty, self.pwm.get_max_duty());
        self.pwm
            .set_duty_cycle(ratio)
            .map_err(|source| PwmChannelError { ratio, source })
    }
}
