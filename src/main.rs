use std::{thread, time::Duration};

use rppal::hal::Delay;
use wave_emitter::soft_pwm_pin::{SoftPwmPin, DEFAULT_FREQUENCY_HZ};
use wave_emitter::std_clock::StdClock;
use wave_emitter::wave::{WaveEmitter, WaveSettings};

/// 心跳LED接入GPIO针脚
const HEARTBEAT_PIN: u8 = 27;
/// 蜂鸣器接入GPIO针脚
const BUZZER_PIN: u8 = 18;

fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    // 开机提示音，只响一次
    let buzzer = SoftPwmPin::new(BUZZER_PIN, DEFAULT_FREQUENCY_HZ)?;
    let mut chirp = WaveEmitter::single_shot(buzzer, Delay::new(), StdClock::new(), true);
    chirp.apply(&WaveSettings::new("boot-chirp", 180, 80, 40));

    // 心跳灯
    let led = SoftPwmPin::new(HEARTBEAT_PIN, DEFAULT_FREQUENCY_HZ)?;
    let mut heartbeat = WaveEmitter::repeating(led, Delay::new(), StdClock::new(), false);
    heartbeat.apply(&WaveSettings::new("heartbeat", 64, 100, 900));

    // 死循环
    loop {
        chirp.emit(3)?;
        heartbeat.emit_for_duration(5000)?;
        println!("💓 心跳 5 秒");
        thread::sleep(Duration::from_millis(100));
    }
}
