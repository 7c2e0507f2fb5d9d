use serde::Serialize;

/// One year's salary breakdown for a staff member.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryDetail {
    /// The work identifier the breakdown belongs to.
    pub work_id: String,
    /// The salary year.
    pub year: i32,
    /// Base pay for the year.
    pub base_pay: f64,
    /// Performance-linked pay.
    pub performance_pay: f64,
    /// Allowances.
    pub allowance: f64,
    /// Deductions.
    pub deduction: f64,
    /// Net pay after deductions.
    pub net_pay: f64,
}
