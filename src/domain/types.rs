// ==========================================
// 服装生产运营平台 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 订单优先级 (Priority)
// ==========================================
// 顺序: Low < Normal < High < Urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,    // 低
    Normal, // 正常
    High,   // 高
    Urgent, // 紧急
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Normal => write!(f, "NORMAL"),
            Priority::High => write!(f, "HIGH"),
            Priority::Urgent => write!(f, "URGENT"),
        }
    }
}

// ==========================================
// 技能等级 (Skill Level)
// ==========================================
// 序数制: BEGINNER=1, INTERMEDIATE=2, ADVANCED=3
// 技能匹配度 = min(1.0, worker / required)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Beginner,     // 初级
    Intermediate, // 中级
    Advanced,     // 高级
}

impl SkillLevel {
    /// 序数值（用于技能匹配度计算）
    pub fn ordinal(&self) -> u8 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillLevel::Beginner => write!(f, "BEGINNER"),
            SkillLevel::Intermediate => write!(f, "INTERMEDIATE"),
            SkillLevel::Advanced => write!(f, "ADVANCED"),
        }
    }
}

// ==========================================
// 班次类型 (Shift Type)
// ==========================================
// 班次时长由配置决定 (schedule/shift_hours_*)，不在此处硬编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    Morning,   // 早班
    Afternoon, // 中班
    Night,     // 夜班
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftType::Morning => write!(f, "MORNING"),
            ShiftType::Afternoon => write!(f, "AFTERNOON"),
            ShiftType::Night => write!(f, "NIGHT"),
        }
    }
}

// ==========================================
// 生产阶段 (Stage)
// ==========================================
// 固定阶段序列: 接单 → 设计 → 裁剪 → 印花 → 缝制 → 质检 → 包装 → 交付
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Intake,   // 接单
    Design,   // 设计
    Cut,      // 裁剪
    Print,    // 印花/绣花
    Sew,      // 缝制
    Qc,       // 质检
    Pack,     // 包装
    Delivery, // 交付
}

impl Stage {
    /// 固定阶段序列（工作流按此顺序生成步骤）
    pub fn sequence() -> [Stage; 8] {
        [
            Stage::Intake,
            Stage::Design,
            Stage::Cut,
            Stage::Print,
            Stage::Sew,
            Stage::Qc,
            Stage::Pack,
            Stage::Delivery,
        ]
    }

    /// 阶段显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Intake => "Order Intake",
            Stage::Design => "Design & Approval",
            Stage::Cut => "Cutting",
            Stage::Print => "Printing/Embroidery",
            Stage::Sew => "Sewing",
            Stage::Qc => "Quality Control",
            Stage::Pack => "Packing",
            Stage::Delivery => "Delivery",
        }
    }

    /// 阶段所需技能等级
    pub fn required_skill(&self) -> SkillLevel {
        match self {
            Stage::Intake => SkillLevel::Beginner,
            Stage::Design => SkillLevel::Advanced,
            Stage::Cut => SkillLevel::Intermediate,
            Stage::Print => SkillLevel::Intermediate,
            Stage::Sew => SkillLevel::Advanced,
            Stage::Qc => SkillLevel::Intermediate,
            Stage::Pack => SkillLevel::Beginner,
            Stage::Delivery => SkillLevel::Beginner,
        }
    }

    /// 阶段基准工时（按订单数量缩放）
    ///
    /// # 参数
    /// - `quantity`: 订单总件数
    pub fn baseline_hours(&self, quantity: i64) -> f64 {
        let q = quantity.max(0) as f64;
        match self {
            Stage::Intake => 1.0,
            Stage::Design => 4.0,
            Stage::Cut => (q / 200.0).ceil() * 2.0,
            Stage::Print => (q / 100.0).ceil() * 3.0,
            Stage::Sew => (q / 50.0).ceil() * 4.0,
            Stage::Qc => (q / 500.0).ceil() * 1.0,
            Stage::Pack => (q / 1000.0).ceil() * 1.0,
            Stage::Delivery => 2.0,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Intake => write!(f, "INTAKE"),
            Stage::Design => write!(f, "DESIGN"),
            Stage::Cut => write!(f, "CUT"),
            Stage::Print => write!(f, "PRINT"),
            Stage::Sew => write!(f, "SEW"),
            Stage::Qc => write!(f, "QC"),
            Stage::Pack => write!(f, "PACK"),
            Stage::Delivery => write!(f, "DELIVERY"),
        }
    }
}

// ==========================================
// 工作流状态 (Workflow Status)
// ==========================================
// 状态机: PLANNED → IN_PROGRESS ⇄ PAUSED → COMPLETED
// 任意非终态 → CANCELLED; COMPLETED/CANCELLED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Planned,
    InProgress,
    Paused,
    Completed,
    Delayed,
    Cancelled,
}

impl WorkflowStatus {
    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Cancelled)
    }

    /// 状态机转换检查
    pub fn can_transition_to(&self, target: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        if *self == target {
            return false;
        }
        // 任意非终态可取消
        if target == Cancelled {
            return !self.is_terminal();
        }
        match (self, target) {
            (Planned, InProgress) => true,
            (InProgress, Paused) => true,
            (InProgress, Completed) => true,
            (InProgress, Delayed) => true,
            (Paused, InProgress) => true,
            (Delayed, InProgress) => true,
            (Delayed, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Planned => write!(f, "PLANNED"),
            WorkflowStatus::InProgress => write!(f, "IN_PROGRESS"),
            WorkflowStatus::Paused => write!(f, "PAUSED"),
            WorkflowStatus::Completed => write!(f, "COMPLETED"),
            WorkflowStatus::Delayed => write!(f, "DELAYED"),
            WorkflowStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 步骤状态 (Step Status)
// ==========================================
// 状态机: PLANNED → IN_PROGRESS → {COMPLETED | PAUSED | DELAYED}
// PAUSED → IN_PROGRESS; 任意非终态 → CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Planned,
    InProgress,
    Completed,
    Paused,
    Delayed,
    Cancelled,
}

impl StepStatus {
    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Cancelled)
    }

    /// 状态机转换检查
    pub fn can_transition_to(&self, target: StepStatus) -> bool {
        use StepStatus::*;
        if *self == target {
            return false;
        }
        if target == Cancelled {
            return !self.is_terminal();
        }
        match (self, target) {
            (Planned, InProgress) => true,
            (InProgress, Completed) => true,
            (InProgress, Paused) => true,
            (InProgress, Delayed) => true,
            (Paused, InProgress) => true,
            (Delayed, InProgress) => true,
            (Delayed, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Planned => write!(f, "PLANNED"),
            StepStatus::InProgress => write!(f, "IN_PROGRESS"),
            StepStatus::Completed => write!(f, "COMPLETED"),
            StepStatus::Paused => write!(f, "PAUSED"),
            StepStatus::Delayed => write!(f, "DELAYED"),
            StepStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,       // 开放（参与 MRP 汇总）
    InProduction,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 是否参与需求汇总
    pub fn is_open_for_planning(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::InProduction)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "OPEN"),
            OrderStatus::InProduction => write!(f, "IN_PRODUCTION"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 建议动作 (Recommended Action)
// ==========================================
// MRP 净额计算输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    OrderNow,  // 立即下单 (shortfall > 0)
    OrderSoon, // 尽快下单 (projected < minimum)
    Adequate,  // 充足
    Excess,    // 过剩 (projected > 2 × current)
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendedAction::OrderNow => write!(f, "ORDER_NOW"),
            RecommendedAction::OrderSoon => write!(f, "ORDER_SOON"),
            RecommendedAction::Adequate => write!(f, "ADEQUATE"),
            RecommendedAction::Excess => write!(f, "EXCESS"),
        }
    }
}

// ==========================================
// 供应计划状态 (Supply Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplyStatus {
    Planned,
    Ordered,
    Shipped,
    Received,
}

impl fmt::Display for SupplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyStatus::Planned => write!(f, "PLANNED"),
            SupplyStatus::Ordered => write!(f, "ORDERED"),
            SupplyStatus::Shipped => write!(f, "SHIPPED"),
            SupplyStatus::Received => write!(f, "RECEIVED"),
        }
    }
}

// ==========================================
// 物料事务类型 (Transaction Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    In,  // 入库（收货/计划收货）
    Out, // 出库（领料）
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::In => write!(f, "IN"),
            TransactionType::Out => write!(f, "OUT"),
        }
    }
}

// ==========================================
// 告警类型 (Alert Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Delay,
    Quality,
    Material,
    Worker,
    Bottleneck,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::Delay => write!(f, "DELAY"),
            AlertType::Quality => write!(f, "QUALITY"),
            AlertType::Material => write!(f, "MATERIAL"),
            AlertType::Worker => write!(f, "WORKER"),
            AlertType::Bottleneck => write!(f, "BOTTLENECK"),
        }
    }
}

// ==========================================
// 严重度 (Severity)
// ==========================================
// 告警与瓶颈共用; 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// 数据库字符串解析
// ==========================================
// 列值非法时回退到保守默认值，避免旧库脏数据直接 panic

impl Priority {
    /// 从字符串解析优先级
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "LOW" => Priority::Low,
            "HIGH" => Priority::High,
            "URGENT" => Priority::Urgent,
            _ => Priority::Normal,
        }
    }
}

impl SkillLevel {
    /// 从字符串解析技能等级
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "BEGINNER" => SkillLevel::Beginner,
            "ADVANCED" => SkillLevel::Advanced,
            _ => SkillLevel::Intermediate,
        }
    }
}

impl ShiftType {
    /// 从字符串解析班次
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "AFTERNOON" => ShiftType::Afternoon,
            "NIGHT" => ShiftType::Night,
            _ => ShiftType::Morning,
        }
    }
}

impl Stage {
    /// 从字符串解析阶段
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DESIGN" => Stage::Design,
            "CUT" => Stage::Cut,
            "PRINT" => Stage::Print,
            "SEW" => Stage::Sew,
            "QC" => Stage::Qc,
            "PACK" => Stage::Pack,
            "DELIVERY" => Stage::Delivery,
            _ => Stage::Intake,
        }
    }
}

impl WorkflowStatus {
    /// 从字符串解析工作流状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => WorkflowStatus::InProgress,
            "PAUSED" => WorkflowStatus::Paused,
            "COMPLETED" => WorkflowStatus::Completed,
            "DELAYED" => WorkflowStatus::Delayed,
            "CANCELLED" => WorkflowStatus::Cancelled,
            _ => WorkflowStatus::Planned,
        }
    }
}

impl StepStatus {
    /// 从字符串解析步骤状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => StepStatus::InProgress,
            "COMPLETED" => StepStatus::Completed,
            "PAUSED" => StepStatus::Paused,
            "DELAYED" => StepStatus::Delayed,
            "CANCELLED" => StepStatus::Cancelled,
            _ => StepStatus::Planned,
        }
    }
}

impl OrderStatus {
    /// 从字符串解析订单状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "IN_PRODUCTION" => OrderStatus::InProduction,
            "COMPLETED" => OrderStatus::Completed,
            "CANCELLED" => OrderStatus::Cancelled,
            _ => OrderStatus::Open,
        }
    }
}

impl TransactionType {
    /// 从字符串解析事务类型
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "OUT" => TransactionType::Out,
            _ => TransactionType::In,
        }
    }
}

impl AlertType {
    /// 从字符串解析告警类型
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "QUALITY" => AlertType::Quality,
            "MATERIAL" => AlertType::Material,
            "WORKER" => AlertType::Worker,
            "BOTTLENECK" => AlertType::Bottleneck,
            _ => AlertType::Delay,
        }
    }
}

impl Severity {
    /// 从字符串解析严重度
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "MEDIUM" => Severity::Medium,
            "HIGH" => Severity::High,
            "CRITICAL" => Severity::Critical,
            _ => Severity::Low,
        }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_level_ordinal() {
        assert_eq!(SkillLevel::Beginner.ordinal(), 1);
        assert_eq!(SkillLevel::Intermediate.ordinal(), 2);
        assert_eq!(SkillLevel::Advanced.ordinal(), 3);
        assert!(SkillLevel::Beginner < SkillLevel::Advanced);
    }

    #[test]
    fn test_stage_sequence_order() {
        let seq = Stage::sequence();
        assert_eq!(seq.len(), 8);
        assert_eq!(seq[0], Stage::Intake);
        assert_eq!(seq[7], Stage::Delivery);
        // 序列必须严格递增
        for w in seq.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_stage_baseline_hours_scale_with_quantity() {
        // 500 件: 裁剪 ceil(500/200)*2 = 6h, 缝制 ceil(500/50)*4 = 40h
        assert_eq!(Stage::Cut.baseline_hours(500), 6.0);
        assert_eq!(Stage::Sew.baseline_hours(500), 40.0);
        // 固定工时阶段不随数量变化
        assert_eq!(Stage::Design.baseline_hours(500), 4.0);
        assert_eq!(Stage::Design.baseline_hours(5000), 4.0);
    }

    #[test]
    fn test_workflow_status_transitions() {
        use WorkflowStatus::*;
        assert!(Planned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Paused));
        assert!(Paused.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Planned.can_transition_to(Cancelled));
        // 非法转换
        assert!(!Planned.can_transition_to(Completed));
        assert!(!Paused.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(InProgress));
    }

    #[test]
    fn test_step_status_transitions() {
        use StepStatus::*;
        assert!(Planned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Delayed));
        assert!(Delayed.can_transition_to(Completed));
        assert!(!Planned.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&WorkflowStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let back: WorkflowStatus = serde_json::from_str("\"IN_PROGRESS\"").unwrap();
        assert_eq!(back, WorkflowStatus::InProgress);

        let json = serde_json::to_string(&RecommendedAction::OrderNow).unwrap();
        assert_eq!(json, "\"ORDER_NOW\"");
    }
}
