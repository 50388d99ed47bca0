#![windows_subsystem = "windows"]
mod cache;
mod client;
mod config;
mod error;
mod form;
mod models;
mod schema;
slint::include_modules!();

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use slint::VecModel;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cache::{RequestCache, RequestState};
use crate::config::AppConfig;
use crate::form::{FormPhase, SearchForm};
use crate::models::{Repository, UserProfile};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();

    // Shared HTTP client
    let http_client = client::build_client(config.github_token.as_deref())?;

    // Background tokio runtime for async HTTP
    let rt = Arc::new(tokio::runtime::Runtime::new()?);

    // Request cache shared between the UI thread and fetch tasks
    let cache = Arc::new(Mutex::new(RequestCache::new()));

    // Form state lives on the UI thread only
    let form = Rc::new(RefCell::new(SearchForm::new()));

    // Create the UI
    let app = AppWindow::new()?;

    // =============================================
    //  CALLBACK: search-requested
    // =============================================
    {
        let app_weak = app.as_weak();
        let form = form.clone();
        let http_client = http_client.clone();
        let rt = rt.clone();
        let cache = cache.clone();

        app.on_search_requested(move |raw| {
            let Some(app) = app_weak.upgrade() else { return };

            let submitted = form.borrow_mut().submit(&raw);
            {
                // The UI only mirrors the form: the profile renders while
                // submitted, the placeholder otherwise.
                let form = form.borrow();
                app.set_searched(form.phase() == FormPhase::Submitted);
                app.set_input_error(
                    form.last_error()
                        .map(ToString::to_string)
                        .unwrap_or_default()
                        .into(),
                );
                app.set_show_repos(form.repos_visible());
            }
            let Ok(username) = submitted else { return };
            debug!(%username, "username committed");

            app.set_committed_username(username.clone().into());
            app.set_repo_error("".into());
            app.set_repo_list(Rc::new(VecModel::default()).into());
            app.set_avatar(slint::Image::default());

            refresh_user(&app, &http_client, &rt, &cache, &username);
        });
    }

    // =============================================
    //  CALLBACK: toggle-repos-requested
    // =============================================
    {
        let app_weak = app.as_weak();
        let form = form.clone();
        let http_client = http_client.clone();
        let rt = rt.clone();
        let cache = cache.clone();

        app.on_toggle_repos_requested(move || {
            let Some(app) = app_weak.upgrade() else { return };

            let visible = form.borrow_mut().toggle_repos();
            app.set_show_repos(visible);
            if !visible {
                return;
            }

            let Some(username) = form.borrow().committed().map(str::to_owned) else {
                return;
            };
            refresh_repos(&app, &http_client, &rt, &cache, &username);
        });
    }

    // =============================================
    //  CALLBACK: profile-clicked
    // =============================================
    app.on_profile_clicked(|url| {
        let _ = open::that(url.as_str());
    });

    // =============================================
    //  CALLBACK: repo-clicked
    // =============================================
    app.on_repo_clicked(|url| {
        let _ = open::that(url.as_str());
    });

    // Run the Slint event loop
    app.run()?;

    Ok(())
}

/// Drives the user hook for `username`: renders whatever the cache holds
/// and issues the fetch when this key has no fresh completion.
fn refresh_user(
    app: &AppWindow,
    http_client: &reqwest::Client,
    rt: &tokio::runtime::Runtime,
    cache: &Arc<Mutex<RequestCache>>,
    username: &str,
) {
    let (must_fetch, state) = {
        let mut guard = cache.lock().expect("cache lock poisoned");
        let must_fetch = guard.users.begin(username);
        (must_fetch, guard.users.state(username))
    };
    render_user_state(app, &state);

    if let RequestState::Ready(user) = &state {
        // Fresh cache hit: only the avatar needs (re)fetching.
        spawn_avatar_fetch(app, http_client, rt, username, user.avatar_url.as_str());
    }

    if !must_fetch {
        debug!(%username, "user cache hit");
        return;
    }

    let app_weak = app.as_weak();
    let http_client = http_client.clone();
    let cache = cache.clone();
    let username = username.to_owned();

    rt.spawn(async move {
        let result = client::fetch_user(&http_client, client::API_BASE, &username).await;
        let avatar = match &result {
            Ok(user) => download_avatar_pixels(&http_client, user.avatar_url.as_str(), 96).await,
            Err(_) => None,
        };

        let state = {
            let mut guard = cache.lock().expect("cache lock poisoned");
            guard.users.complete(&username, result);
            guard.users.state(&username)
        };

        let _ = slint::invoke_from_event_loop(move || {
            let Some(app) = app_weak.upgrade() else { return };
            // The fetch resolved for a superseded key: keep the cache
            // write, render nothing.
            if app.get_committed_username().as_str() != username {
                return;
            }
            render_user_state(&app, &state);
            if let Some((pixels, w, h)) = avatar {
                let buf =
                    slint::SharedPixelBuffer::<slint::Rgba8Pixel>::clone_from_slice(&pixels, w, h);
                app.set_avatar(slint::Image::from_rgba8(buf));
            }
        });
    });
}

/// Drives the repo hook for `username`, mirroring [`refresh_user`].
fn refresh_repos(
    app: &AppWindow,
    http_client: &reqwest::Client,
    rt: &tokio::runtime::Runtime,
    cache: &Arc<Mutex<RequestCache>>,
    username: &str,
) {
    let (must_fetch, state) = {
        let mut guard = cache.lock().expect("cache lock poisoned");
        let must_fetch = guard.repos.begin(username);
        (must_fetch, guard.repos.state(username))
    };
    render_repo_state(app, &state);

    if !must_fetch {
        debug!(%username, "repo cache hit");
        return;
    }

    let app_weak = app.as_weak();
    let http_client = http_client.clone();
    let cache = cache.clone();
    let username = username.to_owned();

    rt.spawn(async move {
        let result = client::fetch_repos(&http_client, client::API_BASE, &username).await;

        let state = {
            let mut guard = cache.lock().expect("cache lock poisoned");
            guard.repos.complete(&username, result);
            guard.repos.state(&username)
        };

        let _ = slint::invoke_from_event_loop(move || {
            let Some(app) = app_weak.upgrade() else { return };
            if app.get_committed_username().as_str() != username {
                return;
            }
            render_repo_state(&app, &state);
        });
    });
}

fn render_user_state(app: &AppWindow, state: &RequestState<UserProfile>) {
    match state {
        RequestState::Idle => {
            app.set_is_loading(false);
            app.set_has_user(false);
            app.set_error_message("".into());
        }
        RequestState::Pending => {
            app.set_is_loading(true);
            app.set_has_user(false);
            app.set_error_message("".into());
        }
        RequestState::Failed(err) => {
            app.set_is_loading(false);
            app.set_has_user(false);
            app.set_error_message(format!("Error: {err}").into());
        }
        RequestState::Ready(user) => {
            app.set_login_name(user.login.clone().into());
            app.set_display_name(user.name.clone().unwrap_or_default().into());
            app.set_bio(user.bio.clone().unwrap_or_default().into());
            app.set_user_location(user.location.clone().unwrap_or_default().into());
            app.set_followers(user.followers.to_string().into());
            app.set_following(user.following.to_string().into());
            app.set_public_repos(user.public_repos.to_string().into());
            app.set_profile_url(
                user.html_url
                    .as_ref()
                    .map(|u| u.to_string())
                    .unwrap_or_default()
                    .into(),
            );
            app.set_error_message("".into());
            app.set_is_loading(false);
            app.set_has_user(true);
        }
    }
}

fn render_repo_state(app: &AppWindow, state: &RequestState<Vec<Repository>>) {
    match state {
        RequestState::Idle => {
            app.set_is_loading_repos(false);
            app.set_repo_error("".into());
        }
        RequestState::Pending => {
            app.set_is_loading_repos(true);
            app.set_repo_error("".into());
        }
        RequestState::Failed(err) => {
            app.set_is_loading_repos(false);
            app.set_repo_error(format!("Error: {err}").into());
        }
        RequestState::Ready(repos) => {
            let entries: Vec<RepoEntry> = repos
                .iter()
                .map(|repo| RepoEntry {
                    name: repo.name.clone().into(),
                    description: repo.description.clone().unwrap_or_default().into(),
                    stars: repo.stargazers_count.to_string().into(),
                    forks: repo.forks_count.to_string().into(),
                    url: repo.html_url.clone().into(),
                })
                .collect();
            app.set_repo_list(Rc::new(VecModel::from(entries)).into());
            app.set_repo_error("".into());
            app.set_is_loading_repos(false);
        }
    }
}

/// Re-fetches just the avatar for a profile already in the cache.
fn spawn_avatar_fetch(
    app: &AppWindow,
    http_client: &reqwest::Client,
    rt: &tokio::runtime::Runtime,
    username: &str,
    avatar_url: &str,
) {
    let app_weak = app.as_weak();
    let http_client = http_client.clone();
    let username = username.to_owned();
    let avatar_url = avatar_url.to_owned();

    rt.spawn(async move {
        let Some((pixels, w, h)) = download_avatar_pixels(&http_client, &avatar_url, 96).await
        else {
            return;
        };
        let _ = slint::invoke_from_event_loop(move || {
            let Some(app) = app_weak.upgrade() else { return };
            if app.get_committed_username().as_str() != username {
                return;
            }
            let buf =
                slint::SharedPixelBuffer::<slint::Rgba8Pixel>::clone_from_slice(&pixels, w, h);
            app.set_avatar(slint::Image::from_rgba8(buf));
        });
    });
}

/// Downloads avatar image bytes and decodes them into raw RGBA pixels.
/// A failed download degrades to no avatar; it never fails the profile.
async fn download_avatar_pixels(
    client: &reqwest::Client,
    url: &str,
    size: u32,
) -> Option<(Vec<u8>, u32, u32)> {
    let sized_url = if url.contains('?') {
        format!("{url}&s={size}")
    } else {
        format!("{url}?s={size}")
    };

    let bytes = client.get(&sized_url).send().await.ok()?.bytes().await.ok()?;
    let dynamic_image = image::load_from_memory(&bytes).ok()?;

    // GitHub sometimes serves a larger cached image than requested.
    let resized = dynamic_image.thumbnail_exact(size, size);

    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();

    Some((rgba.into_raw(), w, h))
}
