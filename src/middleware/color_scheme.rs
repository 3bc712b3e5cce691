use std::sync::Arc;

use tracing::debug;

use crate::route::{PathPattern, Route, RouteMethod};
use crate::server::{ColorScheme, CookiePriority};

/// Name of the color-scheme cookie.
pub const COLOR_SCHEME_COOKIE: &str = "color-scheme";

/// Build the color-scheme negotiation route.
///
/// Reads the `color-scheme` cookie (one of `Default`, `Light`, `Dark`) into
/// the request. A missing or invalid cookie is reset to `Default` on the
/// response. Always proceeds to the next route.
#[must_use]
pub fn color_scheme_route() -> Route {
    Route::new(
        RouteMethod::Use,
        PathPattern::match_all(),
        Arc::new(|req, res, next| {
            match req
                .cookies
                .get(COLOR_SCHEME_COOKIE)
                .and_then(|v| v.parse::<ColorScheme>().ok())
            {
                Some(scheme) => {
                    req.set_color_scheme(scheme);
                }
                None => {
                    debug!("Color-scheme cookie missing or invalid, resetting to Default");
                    req.set_color_scheme(ColorScheme::Default);
                    res.cookies().create(
                        COLOR_SCHEME_COOKIE,
                        ColorScheme::Default.as_str(),
                        CookiePriority::Medium,
                    );
                }
            }
            next.proceed();
            Ok(())
        }),
    )
}
