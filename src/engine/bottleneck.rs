// ==========================================
// 服装生产运营平台 - 瓶颈检测引擎
// ==========================================
// 职责: 步骤实际/计划工时比值分析、就绪队列堆积检测
// 规则: 比值超过配置阈值(默认 1.2)即标记，严重度按超出幅度分档
//       LOW < 1.2× ≤ MEDIUM < 1.5× ≤ HIGH < 2× ≤ CRITICAL
// ==========================================

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::config::PlanningConfig;
use crate::domain::alert::BottleneckAnalysis;
use crate::domain::types::{Severity, StepStatus};
use crate::domain::workflow::{WorkflowInstance, WorkflowStep};

// ==========================================
// BottleneckDetector - 瓶颈检测引擎
// ==========================================
pub struct BottleneckDetector {
    // 无状态引擎，不需要注入依赖
}

impl BottleneckDetector {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 分析单个工作流的瓶颈
    ///
    /// # 参数
    /// - `workflow`: 工作流实例
    /// - `steps`: 该工作流全部步骤（按序号）
    /// - `now`: 当前时刻（进行中步骤以此计算实际运行工时）
    /// - `config`: 配置快照
    pub fn analyze(
        &self,
        workflow: &WorkflowInstance,
        steps: &[WorkflowStep],
        now: DateTime<Utc>,
        config: &PlanningConfig,
    ) -> Vec<BottleneckAnalysis> {
        let mut bottlenecks = Vec::new();

        // 1. 工时超限步骤
        for step in steps {
            let Some(actual_hours) = step.actual_hours(now) else {
                continue;
            };
            if step.estimated_hours <= 0.0 {
                continue;
            }
            let ratio = actual_hours / step.estimated_hours;
            if ratio <= config.bottleneck_ratio_threshold {
                continue;
            }

            let severity = Self::severity_for_ratio(ratio);
            let delay_hours = actual_hours - step.estimated_hours;
            bottlenecks.push(BottleneckAnalysis {
                workflow_id: workflow.workflow_id.clone(),
                step_id: step.step_id.clone(),
                stage: step.stage,
                line_id: None,
                station_id: None,
                severity,
                cause: format!(
                    "实际工时 {:.1}h 为计划 {:.1}h 的 {:.2} 倍",
                    actual_hours, step.estimated_hours, ratio
                ),
                impact: format!("步骤 \"{}\" 预计延误 {:.1}h", step.step_name, delay_hours),
                suggestions: vec![
                    "改派更高技能等级工人".to_string(),
                    "追加加班工时".to_string(),
                    "可并行工序提前开工".to_string(),
                ],
                estimated_delay_hours: delay_hours,
                affected_orders: vec![workflow.order_id.clone()],
            });
        }

        // 2. 就绪队列堆积（依赖已满足但迟迟未开工的步骤数）
        let ready_waiting = Self::ready_waiting_steps(steps);
        if ready_waiting.len() > config.queue_length_threshold {
            // 堆积指向当前进行中的步骤（无进行中步骤时指向首个待开工步骤）
            let blocking = steps
                .iter()
                .find(|s| s.status == StepStatus::InProgress)
                .or_else(|| ready_waiting.first().copied());
            if let Some(step) = blocking {
                let queued_hours: f64 = ready_waiting.iter().map(|s| s.estimated_hours).sum();
                bottlenecks.push(BottleneckAnalysis {
                    workflow_id: workflow.workflow_id.clone(),
                    step_id: step.step_id.clone(),
                    stage: step.stage,
                    line_id: None,
                    station_id: None,
                    severity: Severity::Medium,
                    cause: format!(
                        "{} 个就绪步骤待开工，超过阈值 {}",
                        ready_waiting.len(),
                        config.queue_length_threshold
                    ),
                    impact: format!("排队工作量 {:.1}h", queued_hours),
                    suggestions: vec![
                        "为就绪步骤指派工人".to_string(),
                        "检查工位产能瓶颈".to_string(),
                    ],
                    estimated_delay_hours: queued_hours,
                    affected_orders: vec![workflow.order_id.clone()],
                });
            }
        }

        bottlenecks
    }

    /// 比值分档
    pub fn severity_for_ratio(ratio: f64) -> Severity {
        if ratio >= 2.0 {
            Severity::Critical
        } else if ratio >= 1.5 {
            Severity::High
        } else if ratio >= 1.2 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// 依赖已全部完成但仍处于 PLANNED 的步骤
    fn ready_waiting_steps(steps: &[WorkflowStep]) -> Vec<&WorkflowStep> {
        let completed: HashSet<&str> = steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .map(|s| s.step_id.as_str())
            .collect();

        steps
            .iter()
            .filter(|s| {
                s.status == StepStatus::Planned
                    && s.dependencies.iter().all(|dep| completed.contains(dep.as_str()))
            })
            .collect()
    }
}

impl Default for BottleneckDetector {
    fn default() -> Self {
        Self::new()
    }
}
