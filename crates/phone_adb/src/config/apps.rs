//! App name to Android package mapping

use phf::phf_map;

/// Human-readable app names mapped to their Android package identifiers
pub static APP_PACKAGES: phf::Map<&'static str, &'static str> = phf_map! {
    // Social & messaging
    "微信" => "com.tencent.mm",
    "WeChat" => "com.tencent.mm",
    "QQ" => "com.tencent.mobileqq",
    "微博" => "com.sina.weibo",
    "Telegram" => "org.telegram.messenger",
    "WhatsApp" => "com.whatsapp",
    "X" => "com.twitter.android",
    // Shopping & services
    "淘宝" => "com.taobao.taobao",
    "京东" => "com.jingdong.app.mall",
    "拼多多" => "com.xunmeng.pinduoduo",
    "美团" => "com.sankuai.meituan",
    "饿了么" => "me.ele",
    "支付宝" => "com.eg.android.AlipayGphone",
    "Alipay" => "com.eg.android.AlipayGphone",
    // Content
    "小红书" => "com.xingin.xhs",
    "知乎" => "com.zhihu.android",
    "抖音" => "com.ss.android.ugc.aweme",
    "快手" => "com.smile.gifmaker",
    "bilibili" => "tv.danmaku.bili",
    "网易云音乐" => "com.netease.cloudmusic",
    "QQ音乐" => "com.tencent.qqmusic",
    "YouTube" => "com.google.android.youtube",
    // Travel & maps
    "高德地图" => "com.autonavi.minimap",
    "百度地图" => "com.baidu.BaiduMap",
    "携程" => "ctrip.android.view",
    "12306" => "com.MobileTicket",
    "滴滴出行" => "com.sdu.didi.psnger",
    "Google Maps" => "com.google.android.apps.maps",
    // Google & system
    "Chrome" => "com.android.chrome",
    "Gmail" => "com.google.android.gm",
    "Settings" => "com.android.settings",
    "设置" => "com.android.settings",
    "Clock" => "com.android.deskclock",
    "Contacts" => "com.android.contacts",
    "Camera" => "com.android.camera",
    "Calculator" => "com.android.calculator2",
};

/// Look up the package identifier for an app name
pub fn get_package_name(app_name: &str) -> Option<&'static str> {
    APP_PACKAGES.get(app_name).copied()
}

/// Look up the app name for a package identifier
///
/// Several names may share a package; the lexicographically smallest name is
/// returned so the answer does not depend on map iteration order.
pub fn get_app_name(package: &str) -> Option<&'static str> {
    APP_PACKAGES
        .entries()
        .filter(|(_, pkg)| **pkg == package)
        .map(|(name, _)| *name)
        .min()
}

/// List every supported app name, sorted
pub fn list_supported_apps() -> Vec<&'static str> {
    let mut apps: Vec<&'static str> = APP_PACKAGES.keys().copied().collect();
    apps.sort_unstable();
    apps
}
