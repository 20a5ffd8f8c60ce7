/// 波形参数诊断输出
///
/// - 每次调用接收一整行已格式化好的文本
pub trait DetailSink {
    fn line(&mut self, line: &str);
}

/// 默认诊断输出，转发到`log`日志门面（info级别）
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DetailSink for LogSink {
    fn line(&mut self, line: &str) {
        log::info!("{}", line);
    }
}
