use super::formulas::{
    annuity_future_value, cagr, compound_future_value, inflated_expense_total,
    inflation_adjusted_cost, present_value, required_insurance_cover, required_sip_for_target,
    whole_years,
};
use super::types::{
    BreakdownChart, CalculatorDefinition, CalculatorKind, Derived, GrowthSeries, InputSpec,
    InputValues, ResultRow, UnitFormat,
};

const MONTHS_PER_YEAR: f64 = 12.0;

const fn input(
    key: &'static str,
    label: &'static str,
    min: f64,
    max: f64,
    step: f64,
    default: f64,
    unit: UnitFormat,
) -> InputSpec {
    InputSpec {
        key,
        label,
        min,
        max,
        step,
        default,
        unit,
    }
}

const fn rate_of_return(max: f64, default: f64) -> InputSpec {
    input(
        "rateOfReturn",
        "Expected Annual Return",
        1.0,
        max,
        0.5,
        default,
        UnitFormat::Percentage,
    )
}

const fn inflation(default: f64) -> InputSpec {
    input(
        "inflation",
        "Expected Inflation Rate",
        1.0,
        15.0,
        0.5,
        default,
        UnitFormat::Percentage,
    )
}

const fn years(label: &'static str, max: f64, default: f64) -> InputSpec {
    input("years", label, 1.0, max, 1.0, default, UnitFormat::Years)
}

/// Every built-in calculator in presentation order.
pub fn builtin_definitions() -> Vec<CalculatorDefinition> {
    vec![
        sip(),
        lumpsum(),
        house(),
        education(),
        car(),
        insurance(),
        delay(),
        marriage(),
    ]
}

pub fn sip() -> CalculatorDefinition {
    CalculatorDefinition {
        kind: CalculatorKind::Sip,
        display_name: "SIP Calculator",
        description: "Calculate your systematic investment plan returns",
        inputs: vec![
            input(
                "monthlyInvestment",
                "Monthly Investment",
                500.0,
                1_000_000.0,
                500.0,
                10_000.0,
                UnitFormat::Currency,
            ),
            years("Investment Period", 40.0, 10.0),
            rate_of_return(30.0, 12.0),
        ],
        compute: sip_compute,
        results: sip_results,
        breakdown: invested_vs_returns,
        growth: sip_growth,
    }
}

fn sip_compute(v: &InputValues) -> Derived {
    let monthly = v.get("monthlyInvestment");
    let total_months = v.get("years") * MONTHS_PER_YEAR;
    let future_value = annuity_future_value(monthly, v.get("rateOfReturn"), total_months);
    let invested = monthly * total_months;
    Derived::from([
        ("totalMonths", total_months),
        ("invested", invested),
        ("futureValue", future_value),
        ("returns", future_value - invested),
    ])
}

fn sip_results(v: &InputValues, c: &Derived) -> Vec<ResultRow> {
    vec![
        ResultRow::currency("Monthly Investment", v.get("monthlyInvestment")),
        ResultRow::currency("Total Investment", c.get("invested")),
        ResultRow::currency("Future Value", c.get("futureValue")),
        ResultRow::currency("Total Returns", c.get("returns")),
    ]
}

fn sip_growth(v: &InputValues) -> GrowthSeries {
    let monthly = v.get("monthlyInvestment");
    let rate = v.get("rateOfReturn");
    GrowthSeries::yearly(
        whole_years(v.get("years")),
        &["Invested", "Projected Value"],
        |year| {
            let months = year as f64 * MONTHS_PER_YEAR;
            vec![
                monthly * months,
                annuity_future_value(monthly, rate, months),
            ]
        },
    )
}

pub fn lumpsum() -> CalculatorDefinition {
    CalculatorDefinition {
        kind: CalculatorKind::Lumpsum,
        display_name: "Lumpsum Calculator",
        description: "Calculate returns on a one-time investment",
        inputs: vec![
            input(
                "investment",
                "Total Investment",
                1_000.0,
                10_000_000.0,
                1_000.0,
                500_000.0,
                UnitFormat::Currency,
            ),
            years("Investment Period", 40.0, 10.0),
            rate_of_return(30.0, 12.0),
        ],
        compute: lumpsum_compute,
        results: lumpsum_results,
        breakdown: invested_vs_returns,
        growth: lumpsum_growth,
    }
}

fn lumpsum_compute(v: &InputValues) -> Derived {
    let investment = v.get("investment");
    let years = v.get("years");
    let future_value = compound_future_value(investment, v.get("rateOfReturn"), years);
    Derived::from([
        ("invested", investment),
        ("futureValue", future_value),
        ("returns", future_value - investment),
        ("cagr", cagr(investment, future_value, years)),
    ])
}

fn lumpsum_results(_v: &InputValues, c: &Derived) -> Vec<ResultRow> {
    vec![
        ResultRow::currency("Total Investment", c.get("invested")),
        ResultRow::currency("Future Value", c.get("futureValue")),
        ResultRow::currency("Total Returns", c.get("returns")),
        ResultRow::new("CAGR", c.get("cagr"), UnitFormat::Percentage),
    ]
}

fn lumpsum_growth(v: &InputValues) -> GrowthSeries {
    let investment = v.get("investment");
    let rate = v.get("rateOfReturn");
    GrowthSeries::yearly(
        whole_years(v.get("years")),
        &["Invested", "Projected Value"],
        |year| {
            vec![
                investment,
                compound_future_value(investment, rate, year as f64),
            ]
        },
    )
}

fn invested_vs_returns(_v: &InputValues, c: &Derived) -> BreakdownChart {
    BreakdownChart {
        categories: ["Invested", "Returns"],
        values: [c.get("invested"), c.get("returns").max(0.0)],
    }
}

// Goal planners share one model: inflate today's cost to the goal year, then
// size the SIP and the lump sum that fund it.

/// Years to the goal: the `years` input when present, otherwise the gap
/// between the current age and the goal age, floored at zero.
fn goal_years(v: &InputValues) -> f64 {
    if let Some(years) = v.try_get("years") {
        return years.max(0.0);
    }
    let target_age = v
        .try_get("startAge")
        .or_else(|| v.try_get("marriageAge"))
        .unwrap_or(0.0);
    (target_age - v.get("currentAge")).max(0.0)
}

fn goal_compute(v: &InputValues) -> Derived {
    let years = goal_years(v);
    let total_months = years * MONTHS_PER_YEAR;
    let rate = v.get("rateOfReturn");
    let current_cost = v.get("currentCost");
    let future_cost = inflation_adjusted_cost(current_cost, v.get("inflation"), years);
    let sip_required = required_sip_for_target(future_cost, rate, total_months);
    Derived::from([
        ("years", years),
        ("totalMonths", total_months),
        ("currentCost", current_cost),
        ("futureCost", future_cost),
        ("extra", future_cost - current_cost),
        ("sipRequired", sip_required),
        ("lumpsumRequired", present_value(future_cost, rate, years)),
        ("sipTotalInvestment", sip_required * total_months),
    ])
}

fn goal_results(_v: &InputValues, c: &Derived) -> Vec<ResultRow> {
    vec![
        ResultRow::currency("Current Cost", c.get("currentCost")),
        ResultRow::currency("Future Cost", c.get("futureCost")),
        ResultRow::currency("Extra Needed", c.get("extra")),
        ResultRow::currency("Monthly SIP Required", c.get("sipRequired")),
        ResultRow::currency("Lump Sum Required", c.get("lumpsumRequired")),
    ]
}

fn goal_results_by_age(v: &InputValues, c: &Derived) -> Vec<ResultRow> {
    let mut rows = vec![
        ResultRow::new("Current Age", v.get("currentAge"), UnitFormat::Years),
        ResultRow::new("Years to Goal", c.get("years"), UnitFormat::Years),
    ];
    rows.extend(goal_results(v, c));
    rows
}

fn goal_breakdown(_v: &InputValues, c: &Derived) -> BreakdownChart {
    BreakdownChart {
        categories: ["Current Cost", "Inflation Impact"],
        values: [c.get("currentCost"), c.get("extra").max(0.0)],
    }
}

fn goal_growth(v: &InputValues) -> GrowthSeries {
    let derived = goal_compute(v);
    let sip = derived.get("sipRequired");
    let rate = v.get("rateOfReturn");
    let current_cost = v.get("currentCost");
    let inflation = v.get("inflation");
    GrowthSeries::yearly(
        whole_years(derived.get("years")),
        &["SIP Contributions", "Corpus Value", "Goal Cost"],
        |year| {
            let months = year as f64 * MONTHS_PER_YEAR;
            vec![
                sip * months,
                annuity_future_value(sip, rate, months),
                inflation_adjusted_cost(current_cost, inflation, year as f64),
            ]
        },
    )
}

fn goal_definition(
    kind: CalculatorKind,
    display_name: &'static str,
    description: &'static str,
    inputs: Vec<InputSpec>,
) -> CalculatorDefinition {
    let by_age = inputs.iter().any(|spec| spec.key == "currentAge");
    CalculatorDefinition {
        kind,
        display_name,
        description,
        inputs,
        compute: goal_compute,
        results: if by_age {
            goal_results_by_age
        } else {
            goal_results
        },
        breakdown: goal_breakdown,
        growth: goal_growth,
    }
}

fn current_cost(label: &'static str, min: f64, max: f64, step: f64, default: f64) -> InputSpec {
    input(
        "currentCost",
        label,
        min,
        max,
        step,
        default,
        UnitFormat::Currency,
    )
}

pub fn house() -> CalculatorDefinition {
    goal_definition(
        CalculatorKind::House,
        "House Planning Calculator",
        "Plan your dream home purchase with smart savings",
        vec![
            current_cost(
                "Current House Price",
                500_000.0,
                100_000_000.0,
                100_000.0,
                5_000_000.0,
            ),
            years("Years to Buy", 30.0, 10.0),
            inflation(6.0),
            rate_of_return(20.0, 12.0),
        ],
    )
}

pub fn car() -> CalculatorDefinition {
    goal_definition(
        CalculatorKind::Car,
        "Car Planning Calculator",
        "Plan your dream car purchase with smart financial planning",
        vec![
            current_cost(
                "Current Car Price",
                100_000.0,
                10_000_000.0,
                10_000.0,
                800_000.0,
            ),
            years("Years to Buy", 20.0, 5.0),
            inflation(7.0),
            rate_of_return(20.0, 10.0),
        ],
    )
}

pub fn education() -> CalculatorDefinition {
    goal_definition(
        CalculatorKind::Education,
        "Education Planning Calculator",
        "Plan for your child's education expenses",
        vec![
            input(
                "currentAge",
                "Child's Current Age",
                1.0,
                25.0,
                1.0,
                10.0,
                UnitFormat::Years,
            ),
            input(
                "startAge",
                "Age at the Start of Education",
                5.0,
                30.0,
                1.0,
                18.0,
                UnitFormat::Years,
            ),
            current_cost(
                "Current Education Cost",
                100_000.0,
                5_000_000.0,
                10_000.0,
                1_000_000.0,
            ),
            inflation(6.0),
            rate_of_return(20.0, 10.0),
        ],
    )
}

pub fn marriage() -> CalculatorDefinition {
    goal_definition(
        CalculatorKind::Marriage,
        "Marriage Planning Calculator",
        "Plan and save for wedding expenses",
        vec![
            input(
                "currentAge",
                "Current Age",
                1.0,
                60.0,
                1.0,
                10.0,
                UnitFormat::Years,
            ),
            input(
                "marriageAge",
                "Age at Marriage",
                15.0,
                60.0,
                1.0,
                25.0,
                UnitFormat::Years,
            ),
            current_cost(
                "Current Marriage Expenses",
                100_000.0,
                10_000_000.0,
                10_000.0,
                1_500_000.0,
            ),
            inflation(6.0),
            rate_of_return(20.0, 10.0),
        ],
    )
}

pub fn insurance() -> CalculatorDefinition {
    CalculatorDefinition {
        kind: CalculatorKind::Insurance,
        display_name: "Life Insurance Calculator",
        description: "Calculate your life insurance coverage needs",
        inputs: vec![
            input(
                "loanAmount",
                "Outstanding Loans",
                0.0,
                100_000_000.0,
                10_000.0,
                1_000_000.0,
                UnitFormat::Currency,
            ),
            input(
                "monthlyExpenses",
                "Monthly Household Expenses",
                1_000.0,
                1_000_000.0,
                1_000.0,
                30_000.0,
                UnitFormat::Currency,
            ),
            inflation(6.0),
            input(
                "fdRate",
                "Fixed Deposit Rate",
                1.0,
                15.0,
                0.5,
                7.0,
                UnitFormat::Percentage,
            ),
            years("Years of Protection", 40.0, 20.0),
        ],
        compute: insurance_compute,
        results: insurance_results,
        breakdown: insurance_breakdown,
        growth: insurance_growth,
    }
}

fn insurance_compute(v: &InputValues) -> Derived {
    let years = v.get("years");
    let inflation = v.get("inflation");
    let fd_rate = v.get("fdRate");
    let monthly = v.get("monthlyExpenses");
    let loans = v.get("loanAmount");
    let annual = monthly * MONTHS_PER_YEAR;
    let total_expenses = inflated_expense_total(annual, inflation, years);
    let required_cover = required_insurance_cover(loans, monthly, inflation, fd_rate, years);
    Derived::from([
        ("annualExpenses", annual),
        ("totalExpenses", total_expenses),
        ("expensesPresentValue", required_cover - loans),
        ("requiredCover", required_cover),
    ])
}

fn insurance_results(v: &InputValues, c: &Derived) -> Vec<ResultRow> {
    vec![
        ResultRow::currency("Outstanding Loans", v.get("loanAmount")),
        ResultRow::currency("Monthly Expenses (starting)", v.get("monthlyExpenses")),
        ResultRow::new("Protection Period", v.get("years"), UnitFormat::Years),
        ResultRow::currency(
            "Total Future Expenses (inflation adjusted)",
            c.get("totalExpenses"),
        ),
        ResultRow::currency("Required Insurance Cover", c.get("requiredCover")),
    ]
}

fn insurance_breakdown(v: &InputValues, c: &Derived) -> BreakdownChart {
    BreakdownChart {
        categories: ["Outstanding Loans", "Household Expenses"],
        values: [v.get("loanAmount"), c.get("expensesPresentValue")],
    }
}

fn insurance_growth(v: &InputValues) -> GrowthSeries {
    let annual = v.get("monthlyExpenses") * MONTHS_PER_YEAR;
    let inflation = v.get("inflation");
    GrowthSeries::yearly(
        whole_years(v.get("years")),
        &["Expenses at Today's Prices", "Inflation-Adjusted Expenses"],
        |year| {
            vec![
                annual * year as f64,
                inflated_expense_total(annual, inflation, year as f64),
            ]
        },
    )
}

pub fn delay() -> CalculatorDefinition {
    CalculatorDefinition {
        kind: CalculatorKind::Delay,
        display_name: "Delay Planning Calculator",
        description: "See the cost of delaying your investments",
        inputs: vec![
            input(
                "monthlyInvestment",
                "Monthly SIP",
                500.0,
                1_000_000.0,
                500.0,
                10_000.0,
                UnitFormat::Currency,
            ),
            years("Investment Period", 40.0, 20.0),
            input(
                "delayMonths",
                "Delay in Starting SIP",
                0.0,
                120.0,
                1.0,
                12.0,
                UnitFormat::Months,
            ),
            rate_of_return(30.0, 12.0),
        ],
        compute: delay_compute,
        results: delay_results,
        breakdown: delay_breakdown,
        growth: delay_growth,
    }
}

fn delay_compute(v: &InputValues) -> Derived {
    let monthly = v.get("monthlyInvestment");
    let rate = v.get("rateOfReturn");
    let total_months = v.get("years") * MONTHS_PER_YEAR;
    let invested_months = (total_months - v.get("delayMonths")).max(0.0);
    let no_delay = annuity_future_value(monthly, rate, total_months);
    let with_delay = annuity_future_value(monthly, rate, invested_months);
    Derived::from([
        ("totalMonths", total_months),
        ("investedMonths", invested_months),
        ("investedWithDelay", monthly * invested_months),
        ("futureValueNoDelay", no_delay),
        ("futureValueWithDelay", with_delay),
        ("loss", no_delay - with_delay),
    ])
}

fn delay_results(v: &InputValues, c: &Derived) -> Vec<ResultRow> {
    vec![
        ResultRow::new("Delay", v.get("delayMonths"), UnitFormat::Months),
        ResultRow::currency("Future Value (No Delay)", c.get("futureValueNoDelay")),
        ResultRow::currency("Future Value (With Delay)", c.get("futureValueWithDelay")),
        ResultRow::currency("Wealth Lost Due to Delay", c.get("loss")),
    ]
}

fn delay_breakdown(_v: &InputValues, c: &Derived) -> BreakdownChart {
    BreakdownChart {
        categories: ["With Delay", "Lost to Delay"],
        values: [c.get("futureValueWithDelay"), c.get("loss")],
    }
}

fn delay_growth(v: &InputValues) -> GrowthSeries {
    let monthly = v.get("monthlyInvestment");
    let rate = v.get("rateOfReturn");
    let delay = v.get("delayMonths");
    GrowthSeries::yearly(
        whole_years(v.get("years")),
        &[
            "Invested (With Delay)",
            "Projected (No Delay)",
            "Projected (With Delay)",
        ],
        |year| {
            let months = year as f64 * MONTHS_PER_YEAR;
            let invested_months = (months - delay).max(0.0);
            vec![
                monthly * invested_months,
                annuity_future_value(monthly, rate, months),
                annuity_future_value(monthly, rate, invested_months),
            ]
        },
    )
}
