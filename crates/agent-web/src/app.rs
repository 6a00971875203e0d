//! Main App Component

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::pages::{ChatPage, RequirementsPage};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <nav class="topnav">
                <a href="/">"Requirements"</a>
                <a href="/chat">"Multi-Agent Chat"</a>
            </nav>
            <main class="app">
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=path!("/") view=RequirementsPage />
                    <Route path=path!("/chat") view=ChatPage />
                </Routes>
            </main>
        </Router>
    }
}
