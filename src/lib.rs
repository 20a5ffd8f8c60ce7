pub mod pwm_channel;
pub mod soft_pwm_pin;
pub mod std_clock;
pub mod wave;
