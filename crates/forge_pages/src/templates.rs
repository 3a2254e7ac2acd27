//! Built-in page templates.
//!
//! A freshly initialized page gets a component source seeded from
//! `<templates_root>/<kind>.tsx` when that file exists, or from the built-in
//! defaults below otherwise, plus an HTML shell that loads the compiled
//! bundle from the component endpoint at view time.

use crate::metadata::PageKind;

/// Default React component source for a page kind.
pub fn default_component(kind: PageKind) -> &'static str {
    match kind {
        PageKind::H5 => H5_TEMPLATE,
        PageKind::Admin => ADMIN_TEMPLATE,
        PageKind::Pc => PC_TEMPLATE,
    }
}

/// HTML shell for a page. Loads React from CDN, then fetches the compiled
/// bundle for `page_id` and mounts the exported component on `#root`.
pub fn html_shell(page_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Generated Page</title>
    <script crossorigin src="https://unpkg.com/react@18/umd/react.production.min.js"></script>
    <script crossorigin src="https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"></script>
    <script src="https://unpkg.com/lodash@4/lodash.min.js"></script>
    <style>
        body {{ margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }}
        #root {{ min-height: 100vh; }}
    </style>
</head>
<body>
    <div id="root"></div>
    <script>
        window.addEventListener('DOMContentLoaded', function() {{
            var script = document.createElement('script');
            script.src = '/api/pages/{page_id}/component';
            script.onload = function() {{
                var component = window['PageComponent_{page_id}'];
                var App = component && component.default ? component.default : component;
                if (App) {{
                    ReactDOM.createRoot(document.getElementById('root')).render(React.createElement(App));
                }}
            }};
            document.body.appendChild(script);
        }});
    </script>
</body>
</html>"#
    )
}

/// Best-effort kind detection for pages whose metadata record is missing.
/// Marker-based, mirrors the markers the built-in templates carry.
pub fn detect_kind(content: &str) -> PageKind {
    if content.contains("Mobile Page")
        || content.contains("antd-mobile")
        || (content.contains("viewport") && content.contains("width=device-width"))
    {
        PageKind::H5
    } else if content.contains("Admin Console")
        || content.contains("Sider")
        || (content.contains("Menu") && content.contains("admin"))
    {
        PageKind::Admin
    } else {
        PageKind::Pc
    }
}

const H5_TEMPLATE: &str = r#"import React, { useState } from 'react';

const App: React.FC = () => {
  const [count, setCount] = useState(0);

  return (
    <div style={{ padding: 16, maxWidth: 480, margin: '0 auto' }}>
      <h1 style={{ fontSize: 20 }}>Mobile Page</h1>
      <p>This page was just initialized. Describe what you want and generate it.</p>
      <button
        style={{ padding: '12px 24px', fontSize: 16, borderRadius: 8 }}
        onClick={() => setCount(count + 1)}
      >
        Tapped {count} times
      </button>
    </div>
  );
};

export default App;
"#;

const ADMIN_TEMPLATE: &str = r#"import React, { useState } from 'react';

const App: React.FC = () => {
  const [activeMenu, setActiveMenu] = useState('overview');
  const menuItems = [
    { key: 'overview', label: 'Overview' },
    { key: 'users', label: 'Users' },
    { key: 'settings', label: 'Settings' },
  ];

  return (
    <div style={{ display: 'flex', minHeight: '100vh' }}>
      <aside style={{ width: 200, background: '#001529', color: '#fff', padding: 16 }}>
        <h2 style={{ color: '#fff', fontSize: 16 }}>Admin Console</h2>
        {menuItems.map(item => (
          <div
            key={item.key}
            style={{ padding: 8, cursor: 'pointer', opacity: item.key === activeMenu ? 1 : 0.65 }}
            onClick={() => setActiveMenu(item.key)}
          >
            {item.label}
          </div>
        ))}
      </aside>
      <main style={{ flex: 1, padding: 24 }}>
        <h1>{menuItems.find(item => item.key === activeMenu)?.label}</h1>
        <p>This admin page was just initialized.</p>
      </main>
    </div>
  );
};

export default App;
"#;

const PC_TEMPLATE: &str = r#"import React from 'react';

const App: React.FC = () => {
  return (
    <div>
      <header style={{ padding: '16px 48px', borderBottom: '1px solid #eee' }}>
        <strong>Desktop Page</strong>
      </header>
      <main style={{ padding: 48, maxWidth: 960, margin: '0 auto' }}>
        <h1>Welcome</h1>
        <p>This page was just initialized. Describe what you want and generate it.</p>
      </main>
    </div>
  );
};

export default App;
"#;
