use super::MAX_AMPLITUDE;

/// 波形参数集合
///
/// - 字段保持调用方的原始输入，应用到发射器时才会被限幅
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveSettings {
    /// 波形名称，仅用于日志
    pub name: Option<String>,
    /// 输出幅值，超出0~255的部分会被截断
    pub amplitude: i32,
    /// 高电平持续时间（毫秒）
    pub on_time: i64,
    /// 低电平持续时间（毫秒）
    pub off_time: i64,
}

impl WaveSettings {
    pub fn new(name: &str, amplitude: i32, on_time: i64, off_time: i64) -> Self {
        Self {
            name: Some(name.to_string()),
            amplitude,
            on_time,
            off_time,
        }
    }

    /// 一个完整周期的时长（毫秒），负值按0计算
    pub fn period(&self) -> u64 {
        u64::from(clamp_millis(self.on_time)) + u64::from(clamp_millis(self.off_time))
    }
}

/// 幅值限制在0~255
pub(crate) fn clamp_amplitude(amp: i32) -> u8 {
    amp.clamp(0, i32::from(MAX_AMPLITUDE)) as u8
}

/// 负的时长按0处理，过大的时长截断到u32::MAX
pub(crate) fn clamp_millis(ms: i64) -> u32 {
    ms.clamp(0, i64::from(u32::MAX)) as u32
}
