//! Keyword tables for intent scoring and parameter extraction.
//!
//! All entries are lowercase; matching is substring-based on lowercased text.

use quarry_core::{Entity, Intent};

/// Keywords scored for `intent`. `Unknown` has none.
pub fn intent_keywords(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Statistics => &[
            "count",
            "sum",
            "how many",
            "number of",
            "total",
            "statistics",
            "统计",
            "统计数",
            "数量",
            "总数",
            "总计",
            "统计数据",
        ],
        Intent::Analysis => &[
            "analyze",
            "analyse",
            "analysis",
            "insight",
            "deep dive",
            "分析",
            "分析数据",
            "数据分析",
            "深入分析",
            "详细分析",
        ],
        Intent::Trend => &[
            "trend",
            "over time",
            "growth",
            "evolution",
            "趋势",
            "变化趋势",
            "发展趋势",
            "时间趋势",
            "历史趋势",
        ],
        Intent::Comparison => &[
            "compare",
            "comparison",
            "versus",
            " vs ",
            "difference",
            "对比",
            "比较",
            "对比分析",
            "差异",
            "差距",
        ],
        Intent::Filter => &[
            "filter",
            "find",
            "search",
            "where",
            "lookup",
            "list",
            "筛选",
            "过滤",
            "查找",
            "查询",
            "搜索",
            "筛选出",
        ],
        Intent::Aggregation => &[
            "aggregate",
            "group by",
            "grouped",
            "summarize",
            "roll up",
            "聚合",
            "汇总",
            "分组汇总",
            "分组统计",
        ],
        Intent::Ranking => &[
            "top",
            "rank",
            "ranking",
            "highest",
            "lowest",
            "best",
            "排名",
            "排序",
            "前几名",
            "排名靠前",
            "最高",
        ],
        Intent::Distribution => &[
            "distribution",
            "distributed",
            "proportion",
            "share of",
            "percentage",
            "分布",
            "分布情况",
            "分布分析",
            "占比",
            "比例",
        ],
        Intent::Correlation => &[
            "correlation",
            "correlate",
            "relationship",
            "related to",
            "相关性",
            "相关",
            "关联",
            "关系",
            "相关分析",
        ],
        Intent::Unknown => &[],
    }
}

/// Time-range phrases, most specific first.
pub(crate) const TIME_RANGE_PHRASES: &[&str] = &[
    "last 7 days",
    "last 30 days",
    "past week",
    "past month",
    "this week",
    "last week",
    "this month",
    "last month",
    "this year",
    "last year",
    "yesterday",
    "today",
    "recent",
    "最近7天",
    "最近30天",
    "过去一周",
    "过去一个月",
    "本周",
    "上周",
    "本月",
    "上月",
    "今年",
    "去年",
    "昨天",
    "今天",
    "最近",
    "过去",
    "未来",
];

/// Aggregation-function phrases.
pub(crate) const AGGREGATION_PHRASES: &[&str] = &[
    "sum",
    "average",
    "avg",
    "mean",
    "maximum",
    "minimum",
    "count",
    "total",
    "求和",
    "平均值",
    "平均",
    "均值",
    "最大",
    "最小",
    "计数",
    "总计",
];

/// Entity keywords in priority order.
pub(crate) const ENTITY_KEYWORDS: &[(Entity, &[&str])] = &[
    (Entity::User, &["user", "customer", "用户"]),
    (Entity::Order, &["order", "订单"]),
    (Entity::Product, &["product", "商品"]),
];
