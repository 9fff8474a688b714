//! 翻译轮次调度
//!
//! 同一时刻最多只有一个轮次在修改文档。运行期间到达的触发合并为一个
//! 后续轮次，在当前轮次结束后立即开始。

/// 调度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    /// 已请求，等待下一帧
    Scheduled,
    Running,
    /// 运行中，结束后还需要再跑一轮
    RunningWithFollowUp,
}

/// 调度器要求调用方执行的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerAction {
    None,
    /// 启动帧定时器
    ArmFrame,
    /// 立即开始一个轮次
    StartPass,
}

/// 轮次调度器
#[derive(Debug, Default)]
pub struct PassScheduler {
    state: PassState,
    coalesced: u64,
}

impl PassScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            PassState::Running | PassState::RunningWithFollowUp
        )
    }

    /// 被合并掉的触发次数
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// 变更触发：合并到下一帧
    pub fn request(&mut self) -> SchedulerAction {
        match self.state {
            PassState::Idle => {
                self.state = PassState::Scheduled;
                SchedulerAction::ArmFrame
            }
            PassState::Running => {
                self.state = PassState::RunningWithFollowUp;
                SchedulerAction::None
            }
            PassState::Scheduled | PassState::RunningWithFollowUp => {
                self.coalesced += 1;
                SchedulerAction::None
            }
        }
    }

    /// 帧定时器到期
    pub fn frame_fired(&mut self) -> SchedulerAction {
        match self.state {
            PassState::Scheduled => {
                self.state = PassState::Running;
                SchedulerAction::StartPass
            }
            _ => SchedulerAction::None,
        }
    }

    /// 不等帧，直接开始（初始轮次、语言变化）
    pub fn start_now(&mut self) -> SchedulerAction {
        match self.state {
            PassState::Idle | PassState::Scheduled => {
                self.state = PassState::Running;
                SchedulerAction::StartPass
            }
            PassState::Running => {
                self.state = PassState::RunningWithFollowUp;
                SchedulerAction::None
            }
            PassState::RunningWithFollowUp => {
                self.coalesced += 1;
                SchedulerAction::None
            }
        }
    }

    /// 当前轮次结束
    pub fn pass_finished(&mut self) -> SchedulerAction {
        match self.state {
            PassState::RunningWithFollowUp => {
                self.state = PassState::Running;
                SchedulerAction::StartPass
            }
            PassState::Running => {
                self.state = PassState::Idle;
                SchedulerAction::None
            }
            PassState::Idle | PassState::Scheduled => SchedulerAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_arms_frame_once() {
        let mut scheduler = PassScheduler::new();
        assert_eq!(scheduler.request(), SchedulerAction::ArmFrame);
        assert_eq!(scheduler.request(), SchedulerAction::None);
        assert_eq!(scheduler.state(), PassState::Scheduled);
        assert_eq!(scheduler.coalesced(), 1);

        assert_eq!(scheduler.frame_fired(), SchedulerAction::StartPass);
        assert_eq!(scheduler.frame_fired(), SchedulerAction::None);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_triggers_during_pass_coalesce_into_one_follow_up() {
        let mut scheduler = PassScheduler::new();
        assert_eq!(scheduler.start_now(), SchedulerAction::StartPass);

        for _ in 0..5 {
            assert_eq!(scheduler.request(), SchedulerAction::None);
        }
        assert_eq!(scheduler.state(), PassState::RunningWithFollowUp);

        assert_eq!(scheduler.pass_finished(), SchedulerAction::StartPass);
        assert_eq!(scheduler.state(), PassState::Running);
        assert_eq!(scheduler.pass_finished(), SchedulerAction::None);
        assert_eq!(scheduler.state(), PassState::Idle);
    }

    #[test]
    fn test_start_now_preempts_scheduled_frame() {
        let mut scheduler = PassScheduler::new();
        scheduler.request();
        assert_eq!(scheduler.start_now(), SchedulerAction::StartPass);
        assert_eq!(scheduler.frame_fired(), SchedulerAction::None);
    }

    #[test]
    fn test_pass_finished_when_idle_is_noop() {
        let mut scheduler = PassScheduler::new();
        assert_eq!(scheduler.pass_finished(), SchedulerAction::None);
        assert_eq!(scheduler.state(), PassState::Idle);
    }
}
